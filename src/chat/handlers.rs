use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use base64::Engine;
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::ai::{strip_data_url, CompletionClient};
use crate::auth::AuthUser;
use crate::state::AppState;

use super::dto::{DeleteQuery, DeleteResponse, RenameRequest, SendMessageRequest};
use super::repo::{self, ChatMessage};
use super::services::{self, SessionSummary, DEFAULT_SESSION_NAME};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/sessions", get(list_sessions))
        .route(
            "/chat/sessions/:id",
            patch(rename_session).delete(delete_session),
        )
        .route(
            "/chat/sessions/:id/messages",
            get(session_messages).post(send_message),
        )
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SessionSummary>>, (StatusCode, String)> {
    let rows = repo::list_all_rows(&state.db, user_id)
        .await
        .map_err(internal)?;
    Ok(Json(services::summarize_sessions(&rows)))
}

#[instrument(skip(state))]
pub async fn session_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, (StatusCode, String)> {
    let messages = repo::list_session(&state.db, user_id, session_id)
        .await
        .map_err(internal)?;
    Ok(Json(messages))
}

#[instrument(skip(state, body))]
pub async fn rename_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Json(body): Json<RenameRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name must not be empty".into()));
    }
    let updated = repo::rename_session(&state.db, user_id, session_id, name)
        .await
        .map_err(internal)?;
    if updated == 0 {
        return Err((StatusCode::NOT_FOUND, "Session not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Query(q): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    let deleted = repo::delete_session(&state.db, user_id, session_id)
        .await
        .map_err(internal)?;
    if deleted == 0 {
        return Err((StatusCode::NOT_FOUND, "Session not found".into()));
    }
    Ok(Json(DeleteResponse {
        deleted_messages: deleted,
        replacement_session_id: services::select_after_delete(q.active_session_id, session_id),
    }))
}

/// Sends one user turn to the assistant. The exchange is persisted only
/// after the completion call succeeds, so a failed call leaves the session
/// exactly as it was.
#[instrument(skip(state, body))]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), (StatusCode, String)> {
    let input = body.input.trim();
    let image = match body.image_base64.as_deref() {
        Some(raw) => {
            let data = strip_data_url(raw);
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid base64 image data".into()))?;
            Some(data)
        }
        None => None,
    };
    if input.is_empty() && image.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            "message needs text or an image".into(),
        ));
    }

    let history = repo::list_session(&state.db, user_id, session_id)
        .await
        .map_err(internal)?;

    // Nothing below runs when the completion call fails, so a failed
    // exchange leaves the session exactly as it was.
    let reply = request_reply(
        state.completions.as_ref(),
        &history,
        input,
        image,
        state.config.openai.chat_history_limit,
    )
    .await?;

    let session_name = body
        .session_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| history.last().map(|m| m.session_name.clone()))
        .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string());

    let message = ChatMessage {
        id: Uuid::new_v4(),
        user_id,
        session_id,
        session_name,
        user_input: services::persisted_input(input, image.is_some()),
        ai_response: reply,
        sent_at: OffsetDateTime::now_utc(),
    };
    let stored = repo::insert(&state.db, &message).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Assembles the transcript and runs the completion call, mapping failure
/// to 502. The caller persists the exchange only after this returns Ok.
async fn request_reply(
    completions: &dyn CompletionClient,
    history: &[ChatMessage],
    input: &str,
    image: Option<&str>,
    history_limit: Option<usize>,
) -> Result<String, (StatusCode, String)> {
    let turns = services::assemble_turns(history, input, image, history_limit);
    completions.complete(turns).await.map_err(|e| {
        warn!(error = %e, "completion call failed");
        (StatusCode::BAD_GATEWAY, "Failed to get AI response".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::{InputTurn, MealAnalysis};
    use crate::ai::CompletionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct RefusingCompletions {
        called: AtomicBool,
    }

    #[async_trait]
    impl CompletionClient for RefusingCompletions {
        async fn complete(&self, _turns: Vec<InputTurn>) -> Result<String, CompletionError> {
            self.called.store(true, Ordering::SeqCst);
            Err(CompletionError::EmptyOutput)
        }

        async fn analyze_meal_image(
            &self,
            _image_base64: &str,
        ) -> Result<MealAnalysis, CompletionError> {
            Err(CompletionError::EmptyOutput)
        }
    }

    struct EchoCompletions;

    #[async_trait]
    impl CompletionClient for EchoCompletions {
        async fn complete(&self, turns: Vec<InputTurn>) -> Result<String, CompletionError> {
            Ok(format!("saw {} turns", turns.len()))
        }

        async fn analyze_meal_image(
            &self,
            _image_base64: &str,
        ) -> Result<MealAnalysis, CompletionError> {
            Err(CompletionError::EmptyOutput)
        }
    }

    #[tokio::test]
    async fn failed_completion_maps_to_bad_gateway() {
        let client = RefusingCompletions {
            called: AtomicBool::new(false),
        };
        let err = request_reply(&client, &[], "hello", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert_eq!(err.1, "Failed to get AI response");
        assert!(client.called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn successful_completion_passes_reply_through() {
        let reply = request_reply(&EchoCompletions, &[], "hello", None, None)
            .await
            .unwrap();
        assert_eq!(reply, "saw 1 turns");
    }
}
