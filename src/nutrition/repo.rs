use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NutritionEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub eaten_at: OffsetDateTime,
    pub meal_type: MealType,
    pub food_items: Json<Vec<String>>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub sugar: Option<f64>,
    pub notes: Option<String>,
    pub favorite: bool,
}

const COLUMNS: &str = "id, user_id, eaten_at, meal_type, food_items, calories, protein, \
                       carbs, fats, sugar, notes, favorite";

pub async fn insert(db: &PgPool, entry: &NutritionEntry) -> anyhow::Result<NutritionEntry> {
    let row = sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        INSERT INTO nutrition_entries
            ({COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(entry.id)
    .bind(entry.user_id)
    .bind(entry.eaten_at)
    .bind(entry.meal_type)
    .bind(&entry.food_items)
    .bind(entry.calories)
    .bind(entry.protein)
    .bind(entry.carbs)
    .bind(entry.fats)
    .bind(entry.sugar)
    .bind(&entry.notes)
    .bind(entry.favorite)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Entries whose timestamp falls in the half-open interval `[from, to)`,
/// newest first.
pub async fn list_between(
    db: &PgPool,
    user_id: Uuid,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> anyhow::Result<Vec<NutritionEntry>> {
    let rows = sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM nutrition_entries
        WHERE user_id = $1 AND eaten_at >= $2 AND eaten_at < $3
        ORDER BY eaten_at DESC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Entries from `since` onward, oldest first (trend and monthly windows).
pub async fn list_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<NutritionEntry>> {
    let rows = sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM nutrition_entries
        WHERE user_id = $1 AND eaten_at >= $2
        ORDER BY eaten_at ASC
        "#
    ))
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_recent(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<NutritionEntry>> {
    let rows = sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM nutrition_entries
        WHERE user_id = $1
        ORDER BY eaten_at DESC
        LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Full replacement of an existing entry. Edits are never partial.
pub async fn replace(db: &PgPool, entry: &NutritionEntry) -> anyhow::Result<Option<NutritionEntry>> {
    let row = sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        UPDATE nutrition_entries
        SET eaten_at = $3, meal_type = $4, food_items = $5, calories = $6,
            protein = $7, carbs = $8, fats = $9, sugar = $10, notes = $11,
            favorite = $12
        WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(entry.id)
    .bind(entry.user_id)
    .bind(entry.eaten_at)
    .bind(entry.meal_type)
    .bind(&entry.food_items)
    .bind(entry.calories)
    .bind(entry.protein)
    .bind(entry.carbs)
    .bind(entry.fats)
    .bind(entry.sugar)
    .bind(&entry.notes)
    .bind(entry.favorite)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM nutrition_entries
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
