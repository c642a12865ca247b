use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use time::{Date, Month, UtcOffset};

use super::repo::NutritionEntry;
use crate::measurements::repo::Measurement;

/// Summed macros for one local day. Zero entries means all-zero totals,
/// never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutritionMetric {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl NutritionMetric {
    fn of(self, entry: &NutritionEntry) -> f64 {
        match self {
            Self::Calories => entry.calories,
            Self::Protein => entry.protein,
            Self::Carbs => entry.carbs,
            Self::Fat => entry.fats,
        }
    }
}

/// Metric selector for the 30-day trend; weight comes from measurements,
/// everything else from nutrition entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Calories,
    Protein,
    Carbs,
    Fat,
    Weight,
}

impl TrendMetric {
    pub fn as_nutrition(self) -> Option<NutritionMetric> {
        match self {
            Self::Calories => Some(NutritionMetric::Calories),
            Self::Protein => Some(NutritionMetric::Protein),
            Self::Carbs => Some(NutritionMetric::Carbs),
            Self::Fat => Some(NutritionMetric::Fat),
            Self::Weight => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyComparison {
    pub current_month_avg: i64,
    pub previous_month_avg: i64,
    pub delta: i64,
}

/// Field-wise exact sum over the given entries (one local day's worth).
pub fn daily_totals(entries: &[NutritionEntry]) -> MacroTotals {
    entries.iter().fold(MacroTotals::default(), |acc, e| MacroTotals {
        calories: acc.calories + e.calories,
        protein: acc.protein + e.protein,
        carbs: acc.carbs + e.carbs,
        fats: acc.fats + e.fats,
    })
}

/// One point per distinct local calendar day that has at least one entry,
/// value = sum of the metric across that day's entries. Input order does
/// not matter; output is ascending by day.
pub fn nutrition_trend(
    entries: &[NutritionEntry],
    metric: NutritionMetric,
    offset: UtcOffset,
) -> Vec<TrendPoint> {
    let mut days: BTreeMap<Date, f64> = BTreeMap::new();
    for entry in entries {
        let day = entry.eaten_at.to_offset(offset).date();
        *days.entry(day).or_default() += metric.of(entry);
    }
    days.into_iter()
        .map(|(day, value)| TrendPoint {
            date: day.to_string(),
            value,
        })
        .collect()
}

/// Weight series, one point per day with a measurement. When several
/// measurements land on the same day the last one wins (input ascending).
pub fn weight_trend(measurements: &[Measurement], offset: UtcOffset) -> Vec<TrendPoint> {
    let mut days: BTreeMap<Date, f64> = BTreeMap::new();
    for m in measurements {
        if let Some(weight) = m.weight_kg {
            days.insert(m.measured_at.to_offset(offset).date(), weight);
        }
    }
    days.into_iter()
        .map(|(day, value)| TrendPoint {
            date: day.to_string(),
            value,
        })
        .collect()
}

/// Average daily total of `metric` for the month of `today` (to date) and
/// the immediately preceding calendar month. The denominator counts only
/// days that have at least one entry and is clamped to 1, so a month with
/// no data averages to zero rather than dividing by zero. Results are
/// rounded to the nearest integer.
pub fn monthly_comparison(
    entries: &[NutritionEntry],
    metric: NutritionMetric,
    today: Date,
    offset: UtcOffset,
) -> MonthlyComparison {
    let current = (today.year(), today.month());
    let previous = previous_month(today);

    let mut current_days: BTreeMap<Date, f64> = BTreeMap::new();
    let mut previous_days: BTreeMap<Date, f64> = BTreeMap::new();
    for entry in entries {
        let day = entry.eaten_at.to_offset(offset).date();
        let month = (day.year(), day.month());
        if month == current {
            *current_days.entry(day).or_default() += metric.of(entry);
        } else if month == previous {
            *previous_days.entry(day).or_default() += metric.of(entry);
        }
    }

    let current_month_avg = average_of_days(&current_days);
    let previous_month_avg = average_of_days(&previous_days);
    MonthlyComparison {
        current_month_avg,
        previous_month_avg,
        delta: current_month_avg - previous_month_avg,
    }
}

fn average_of_days(days: &BTreeMap<Date, f64>) -> i64 {
    let total: f64 = days.values().sum();
    let qualifying = days.len().max(1) as f64;
    (total / qualifying).round() as i64
}

/// First day of the month preceding `today`'s month; the earliest entry
/// the comparison can use, so also the fetch window start.
pub fn comparison_window_start(today: Date) -> Date {
    let (year, month) = previous_month(today);
    Date::from_calendar_date(year, month, 1).expect("day 1 is valid for every month")
}

fn previous_month(today: Date) -> (i32, Month) {
    match today.month() {
        Month::January => (today.year() - 1, Month::December),
        month => (today.year(), month.previous()),
    }
}

/// Quick-pick list: input is newest-first; only the first occurrence of an
/// identical (meal type, food-item list) pair survives.
pub fn dedupe_previous_meals(entries: Vec<NutritionEntry>) -> Vec<NutritionEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert((e.meal_type, e.food_items.0.clone())))
        .collect()
}

/// Checks the entry invariants before anything touches the database.
pub fn validate_entry(food_items: &[String], macros: &MacroTotals, sugar: Option<f64>) -> Result<(), String> {
    if food_items.iter().all(|item| item.trim().is_empty()) {
        return Err("food_items must contain at least one item".into());
    }
    for (name, value) in [
        ("calories", macros.calories),
        ("protein", macros.protein),
        ("carbs", macros.carbs),
        ("fats", macros.fats),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be a non-negative number"));
        }
    }
    if let Some(s) = sugar {
        if !s.is_finite() || s < 0.0 {
            return Err("sugar must be a non-negative number".into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::datetime;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn entry(eaten_at: OffsetDateTime, calories: f64, protein: f64) -> NutritionEntry {
        NutritionEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            eaten_at,
            meal_type: super::super::repo::MealType::Lunch,
            food_items: Json(vec!["rice".into(), "chicken".into()]),
            calories,
            protein,
            carbs: 10.0,
            fats: 5.0,
            sugar: None,
            notes: None,
            favorite: false,
        }
    }

    #[test]
    fn empty_day_totals_are_zero_not_an_error() {
        assert_eq!(daily_totals(&[]), MacroTotals::default());
    }

    #[test]
    fn daily_totals_are_exact_sums() {
        let entries = vec![
            entry(datetime!(2025-03-10 08:30 UTC), 420.0, 15.0),
            entry(datetime!(2025-03-10 12:45 UTC), 580.0, 45.0),
        ];
        let totals = daily_totals(&entries);
        assert_eq!(totals.calories, 1000.0);
        assert_eq!(totals.protein, 60.0);
        assert_eq!(totals.carbs, 20.0);
        assert_eq!(totals.fats, 10.0);
    }

    #[test]
    fn trend_groups_by_local_day() {
        let entries = vec![
            entry(datetime!(2025-03-01 09:00 UTC), 100.0, 10.0),
            entry(datetime!(2025-03-01 19:00 UTC), 200.0, 10.0),
            entry(datetime!(2025-03-03 12:00 UTC), 300.0, 10.0),
        ];
        let points = nutrition_trend(&entries, NutritionMetric::Calories, UtcOffset::UTC);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2025-03-01");
        assert_eq!(points[0].value, 300.0);
        assert_eq!(points[1].date, "2025-03-03");
        assert_eq!(points[1].value, 300.0);
    }

    #[test]
    fn trend_respects_timezone_offset() {
        // 23:30 UTC on March 1st is already March 2nd at UTC+2.
        let entries = vec![entry(datetime!(2025-03-01 23:30 UTC), 150.0, 10.0)];
        let offset = UtcOffset::from_whole_seconds(2 * 3600).unwrap();
        let points = nutrition_trend(&entries, NutritionMetric::Calories, offset);
        assert_eq!(points[0].date, "2025-03-02");
    }

    #[test]
    fn weight_trend_last_write_wins_per_day() {
        let m = |at, w: f64| Measurement {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            measured_at: at,
            weight_kg: Some(w),
            body_fat_pct: None,
            chest_cm: None,
            waist_cm: None,
            arm_cm: None,
        };
        let measurements = vec![
            m(datetime!(2025-03-01 08:00 UTC), 72.8),
            m(datetime!(2025-03-01 21:00 UTC), 72.4),
            m(datetime!(2025-03-02 08:00 UTC), 72.1),
        ];
        let points = weight_trend(&measurements, UtcOffset::UTC);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 72.4);
        assert_eq!(points[1].value, 72.1);
    }

    #[test]
    fn monthly_average_counts_only_qualifying_days() {
        // Three qualifying days in February: 100, 200, 300 => average 200,
        // regardless of how many February days had no entries.
        let entries = vec![
            entry(datetime!(2025-02-03 12:00 UTC), 100.0, 0.0),
            entry(datetime!(2025-02-10 12:00 UTC), 200.0, 0.0),
            entry(datetime!(2025-02-21 12:00 UTC), 300.0, 0.0),
            entry(datetime!(2025-03-05 12:00 UTC), 500.0, 0.0),
        ];
        let cmp = monthly_comparison(
            &entries,
            NutritionMetric::Calories,
            datetime!(2025-03-15 00:00 UTC).date(),
            UtcOffset::UTC,
        );
        assert_eq!(cmp.previous_month_avg, 200);
        assert_eq!(cmp.current_month_avg, 500);
        assert_eq!(cmp.delta, 300);
    }

    #[test]
    fn monthly_average_with_no_data_is_zero() {
        let cmp = monthly_comparison(
            &[],
            NutritionMetric::Protein,
            datetime!(2025-03-15 00:00 UTC).date(),
            UtcOffset::UTC,
        );
        assert_eq!(cmp.current_month_avg, 0);
        assert_eq!(cmp.previous_month_avg, 0);
        assert_eq!(cmp.delta, 0);
    }

    #[test]
    fn previous_month_wraps_across_january() {
        let (year, month) = previous_month(datetime!(2025-01-10 00:00 UTC).date());
        assert_eq!(year, 2024);
        assert_eq!(month, Month::December);
    }

    #[test]
    fn monthly_comparison_sums_multiple_entries_per_day() {
        let entries = vec![
            entry(datetime!(2025-02-03 08:00 UTC), 400.0, 0.0),
            entry(datetime!(2025-02-03 13:00 UTC), 600.0, 0.0),
        ];
        let cmp = monthly_comparison(
            &entries,
            NutritionMetric::Calories,
            datetime!(2025-03-15 00:00 UTC).date(),
            UtcOffset::UTC,
        );
        // One qualifying day summing to 1000.
        assert_eq!(cmp.previous_month_avg, 1000);
    }

    #[test]
    fn dedupe_keeps_first_of_identical_pairs() {
        let mut newer = entry(datetime!(2025-03-10 12:00 UTC), 500.0, 20.0);
        let mut older = entry(datetime!(2025-03-08 12:00 UTC), 480.0, 18.0);
        newer.food_items = Json(vec!["oatmeal".into(), "banana".into()]);
        older.food_items = Json(vec!["oatmeal".into(), "banana".into()]);
        let newer_id = newer.id;

        // Newest first, as the repo returns them.
        let deduped = dedupe_previous_meals(vec![newer, older]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].id, newer_id);
    }

    #[test]
    fn dedupe_distinguishes_different_item_order() {
        let mut a = entry(datetime!(2025-03-10 12:00 UTC), 500.0, 20.0);
        let mut b = entry(datetime!(2025-03-08 12:00 UTC), 480.0, 18.0);
        a.food_items = Json(vec!["rice".into(), "beans".into()]);
        b.food_items = Json(vec!["beans".into(), "rice".into()]);
        assert_eq!(dedupe_previous_meals(vec![a, b]).len(), 2);
    }

    #[test]
    fn validate_rejects_bad_macros() {
        let items = vec!["toast".to_string()];
        let ok = MacroTotals {
            calories: 210.0,
            protein: 6.0,
            carbs: 30.0,
            fats: 7.0,
        };
        assert!(validate_entry(&items, &ok, Some(4.0)).is_ok());

        let negative = MacroTotals {
            calories: -1.0,
            ..ok
        };
        assert!(validate_entry(&items, &negative, None).is_err());

        let nan = MacroTotals {
            protein: f64::NAN,
            ..ok
        };
        assert!(validate_entry(&items, &nan, None).is_err());
        assert!(validate_entry(&[], &ok, None).is_err());
        assert!(validate_entry(&["  ".to_string()], &ok, None).is_err());
        assert!(validate_entry(&items, &ok, Some(-2.0)).is_err());
    }
}
