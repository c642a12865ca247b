use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One recorded measurement event. Append-only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Measurement {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub measured_at: OffsetDateTime,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub chest_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub arm_cm: Option<f64>,
}

const COLUMNS: &str =
    "id, user_id, measured_at, weight_kg, body_fat_pct, chest_cm, waist_cm, arm_cm";

pub async fn insert(db: &PgPool, m: &Measurement) -> anyhow::Result<Measurement> {
    let row = sqlx::query_as::<_, Measurement>(&format!(
        r#"
        INSERT INTO measurements ({COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(m.id)
    .bind(m.user_id)
    .bind(m.measured_at)
    .bind(m.weight_kg)
    .bind(m.body_fat_pct)
    .bind(m.chest_cm)
    .bind(m.waist_cm)
    .bind(m.arm_cm)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_recent(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<Measurement>> {
    let rows = sqlx::query_as::<_, Measurement>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM measurements
        WHERE user_id = $1
        ORDER BY measured_at DESC
        LIMIT $2
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Rows with a weight value from `since` onward, oldest first, so the
/// trend's last-write-wins day grouping sees them in order.
pub async fn list_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<Measurement>> {
    let rows = sqlx::query_as::<_, Measurement>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM measurements
        WHERE user_id = $1 AND measured_at >= $2 AND weight_kg IS NOT NULL
        ORDER BY measured_at ASC
        "#
    ))
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
