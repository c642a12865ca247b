use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One stored exchange: the user's input and the assistant's reply. A chat
/// session is nothing but the set of rows sharing `session_id`; the session
/// name is denormalized onto every row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub session_name: String,
    pub user_input: String,
    pub ai_response: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

/// Slim projection used for the session list.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub session_id: Uuid,
    pub session_name: String,
    pub sent_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, session_id, session_name, user_input, ai_response, sent_at";

pub async fn insert(db: &PgPool, message: &ChatMessage) -> anyhow::Result<ChatMessage> {
    let row = sqlx::query_as::<_, ChatMessage>(&format!(
        r#"
        INSERT INTO chat_messages ({COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(message.id)
    .bind(message.user_id)
    .bind(message.session_id)
    .bind(&message.session_name)
    .bind(&message.user_input)
    .bind(&message.ai_response)
    .bind(message.sent_at)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// All messages of one session, oldest first (transcript order).
pub async fn list_session(
    db: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> anyhow::Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, ChatMessage>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM chat_messages
        WHERE user_id = $1 AND session_id = $2
        ORDER BY sent_at ASC
        "#
    ))
    .bind(user_id)
    .bind(session_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Every message row of the user, newest first, for session grouping.
pub async fn list_all_rows(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<SessionRow>> {
    let rows = sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT session_id, session_name, sent_at
        FROM chat_messages
        WHERE user_id = $1
        ORDER BY sent_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Bulk-updates the denormalized name on every row of the session. A
/// single statement, so the multi-row write cannot be partially applied.
pub async fn rename_session(
    db: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
    name: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE chat_messages
        SET session_name = $3
        WHERE user_id = $1 AND session_id = $2
        "#,
    )
    .bind(user_id)
    .bind(session_id)
    .bind(name)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_session(db: &PgPool, user_id: Uuid, session_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM chat_messages
        WHERE user_id = $1 AND session_id = $2
        "#,
    )
    .bind(user_id)
    .bind(session_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}
