use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub performed_at: OffsetDateTime,
    pub duration_min: Option<i32>,
    pub calories_burned: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub exercise_id: Uuid,
    pub sets: i32,
    pub reps: i32,
    pub weight_kg: f64,
    pub notes: Option<String>,
}

/// Global exercise catalog; not scoped to a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub kind: String,
    pub video_url: Option<String>,
}

const SESSION_COLUMNS: &str = "id, user_id, performed_at, duration_min, calories_burned, notes";
const ENTRY_COLUMNS: &str = "id, session_id, exercise_id, sets, reps, weight_kg, notes";

pub async fn insert_session_tx(
    tx: &mut Transaction<'_, Postgres>,
    session: &WorkoutSession,
) -> anyhow::Result<WorkoutSession> {
    let row = sqlx::query_as::<_, WorkoutSession>(&format!(
        r#"
        INSERT INTO workout_sessions ({SESSION_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {SESSION_COLUMNS}
        "#
    ))
    .bind(session.id)
    .bind(session.user_id)
    .bind(session.performed_at)
    .bind(session.duration_min)
    .bind(session.calories_burned)
    .bind(&session.notes)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}

pub async fn insert_entry_tx(
    tx: &mut Transaction<'_, Postgres>,
    entry: &WorkoutEntry,
) -> anyhow::Result<()> {
    sqlx::query(&format!(
        r#"
        INSERT INTO workout_entries ({ENTRY_COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#
    ))
    .bind(entry.id)
    .bind(entry.session_id)
    .bind(entry.exercise_id)
    .bind(entry.sets)
    .bind(entry.reps)
    .bind(entry.weight_kg)
    .bind(&entry.notes)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_recent(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<WorkoutSession>> {
    let rows = sqlx::query_as::<_, WorkoutSession>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM workout_sessions
        WHERE user_id = $1
        ORDER BY performed_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get_with_entries(
    db: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> anyhow::Result<Option<(WorkoutSession, Vec<WorkoutEntry>)>> {
    let Some(session) = sqlx::query_as::<_, WorkoutSession>(&format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM workout_sessions
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    else {
        return Ok(None);
    };

    let entries = sqlx::query_as::<_, WorkoutEntry>(&format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM workout_entries
        WHERE session_id = $1
        ORDER BY id
        "#
    ))
    .bind(session_id)
    .fetch_all(db)
    .await?;

    Ok(Some((session, entries)))
}

pub async fn delete_session(db: &PgPool, user_id: Uuid, session_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM workout_sessions
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_exercises(db: &PgPool) -> anyhow::Result<Vec<Exercise>> {
    let rows = sqlx::query_as::<_, Exercise>(
        r#"
        SELECT id, name, category, kind, video_url
        FROM exercises
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert_exercise(db: &PgPool, exercise: &Exercise) -> anyhow::Result<Exercise> {
    let row = sqlx::query_as::<_, Exercise>(
        r#"
        INSERT INTO exercises (id, name, category, kind, video_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, category, kind, video_url
        "#,
    )
    .bind(exercise.id)
    .bind(&exercise.name)
    .bind(&exercise.category)
    .bind(&exercise.kind)
    .bind(&exercise.video_url)
    .fetch_one(db)
    .await?;
    Ok(row)
}
