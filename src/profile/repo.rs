use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_goal: Option<String>,
    pub units_preference: String,
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_fats: Option<f64>,
    pub target_sugar: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Mutable profile fields; `None` leaves the stored value untouched.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_goal: Option<String>,
    pub units_preference: Option<String>,
    pub target_calories: Option<f64>,
    pub target_protein: Option<f64>,
    pub target_fats: Option<f64>,
    pub target_sugar: Option<f64>,
}

const COLUMNS: &str = "id, user_id, name, age, height_cm, weight_kg, fitness_goal, \
                       units_preference, target_calories, target_protein, target_fats, \
                       target_sugar, created_at, updated_at";

/// Upsert on first access: a profile row exists from the first read on.
pub async fn get_or_create(db: &PgPool, user_id: Uuid, email: &str) -> anyhow::Result<Profile> {
    if let Some(profile) = sqlx::query_as::<_, Profile>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM profiles
        WHERE user_id = $1
        "#
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?
    {
        return Ok(profile);
    }

    let default_name = email.split('@').next().unwrap_or("User");
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        INSERT INTO profiles (user_id, name, units_preference)
        VALUES ($1, $2, 'metric')
        ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(default_name)
    .fetch_one(db)
    .await?;
    Ok(profile)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    changes: &ProfileUpdate,
) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
        SET name             = COALESCE($2, name),
            age              = COALESCE($3, age),
            height_cm        = COALESCE($4, height_cm),
            weight_kg        = COALESCE($5, weight_kg),
            fitness_goal     = COALESCE($6, fitness_goal),
            units_preference = COALESCE($7, units_preference),
            target_calories  = COALESCE($8, target_calories),
            target_protein   = COALESCE($9, target_protein),
            target_fats      = COALESCE($10, target_fats),
            target_sugar     = COALESCE($11, target_sugar),
            updated_at       = now()
        WHERE user_id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&changes.name)
    .bind(changes.age)
    .bind(changes.height_cm)
    .bind(changes.weight_kg)
    .bind(&changes.fitness_goal)
    .bind(&changes.units_preference)
    .bind(changes.target_calories)
    .bind(changes.target_protein)
    .bind(changes.target_fats)
    .bind(changes.target_sugar)
    .fetch_optional(db)
    .await?;
    Ok(profile)
}

pub async fn set_weight(db: &PgPool, user_id: Uuid, weight_kg: f64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE profiles
        SET weight_kg = $2, updated_at = now()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(weight_kg)
    .execute(db)
    .await?;
    Ok(())
}
