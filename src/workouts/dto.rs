use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{WorkoutEntry, WorkoutSession};

#[derive(Debug, Deserialize)]
pub struct CreateWorkoutRequest {
    pub duration_min: Option<i32>,
    pub calories_burned: Option<i32>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub performed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub entries: Vec<EntryBody>,
}

#[derive(Debug, Deserialize)]
pub struct EntryBody {
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutDetails {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub entries: Vec<WorkoutEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    pub category: String,
    pub kind: String,
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}
