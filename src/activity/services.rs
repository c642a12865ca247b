use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::repo::NutritionEntry;
use crate::workouts::repo::WorkoutSession;

/// How many items the merged feed shows.
pub const FEED_LIMIT: usize = 5;
/// How many rows of each kind feed the merge.
pub const FETCH_PER_KIND: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Meal,
    Workout,
}

/// Uniform feed item shape for both event logs.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub title: String,
    pub subtitle: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ActivityItem {
    fn from_meal(entry: &NutritionEntry) -> Self {
        Self {
            id: entry.id,
            kind: ActivityKind::Meal,
            title: format!(
                "{} - {}",
                entry.meal_type.as_str(),
                entry.food_items.0.join(", ")
            ),
            subtitle: format!("{} cal", entry.calories.round() as i64),
            timestamp: entry.eaten_at,
        }
    }

    fn from_workout(session: &WorkoutSession) -> Self {
        Self {
            id: session.id,
            kind: ActivityKind::Workout,
            title: "Workout Session".into(),
            subtitle: format!(
                "{} min • {} cal",
                session.duration_min.unwrap_or(0),
                session.calories_burned.unwrap_or(0)
            ),
            timestamp: session.performed_at,
        }
    }
}

/// Merges the two event logs into one reverse-chronological feed capped at
/// [`FEED_LIMIT`]. No deduplication across kinds.
pub fn build_feed(meals: &[NutritionEntry], workouts: &[WorkoutSession]) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = meals
        .iter()
        .map(ActivityItem::from_meal)
        .chain(workouts.iter().map(ActivityItem::from_workout))
        .collect();
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items.truncate(FEED_LIMIT);
    items
}
