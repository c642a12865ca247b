use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::state::AppState;
use crate::{nutrition, workouts};

use super::services::{self, ActivityItem, FETCH_PER_KIND};

pub fn routes() -> Router<AppState> {
    Router::new().route("/activity/recent", get(recent_activity))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state))]
pub async fn recent_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ActivityItem>>, (StatusCode, String)> {
    let meals = nutrition::repo::list_recent(&state.db, user_id, FETCH_PER_KIND)
        .await
        .map_err(internal)?;
    let sessions = workouts::repo::list_recent(&state.db, user_id, FETCH_PER_KIND, 0)
        .await
        .map_err(internal)?;
    Ok(Json(services::build_feed(&meals, &sessions)))
}
