use serde::Deserialize;
use time::OffsetDateTime;

use super::repo::MealType;
use super::services::{NutritionMetric, TrendMetric};

#[derive(Debug, Deserialize)]
pub struct EntryBody {
    pub meal_type: MealType,
    pub food_items: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub sugar: Option<f64>,
    pub notes: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    /// Defaults to "now" when omitted (the add-meal flow logs as-you-eat).
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub eaten_at: Option<OffsetDateTime>,
}

/// Day selector shared by the entries list and the daily summary.
#[derive(Debug, Deserialize)]
pub struct DayQuery {
    /// YYYY-MM-DD in the caller's local time; today when omitted.
    pub date: Option<String>,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub metric: TrendMetric,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    pub metric: NutritionMetric,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_base64: String,
}
