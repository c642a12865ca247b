use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::state::AppState;

use super::dto::{
    CreateExerciseRequest, CreateWorkoutRequest, EntryBody, Pagination, WorkoutDetails,
};
use super::repo::{self, Exercise, WorkoutEntry, WorkoutSession};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route("/workouts/:id", get(get_workout).delete(delete_workout))
        .route("/exercises", get(list_exercises).post(create_exercise))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn validate(body: &CreateWorkoutRequest) -> Result<(), String> {
    if let Some(d) = body.duration_min {
        if d <= 0 {
            return Err("duration_min must be positive".into());
        }
    }
    if let Some(c) = body.calories_burned {
        if c < 0 {
            return Err("calories_burned must be non-negative".into());
        }
    }
    for entry in &body.entries {
        validate_entry(entry)?;
    }
    Ok(())
}

fn validate_entry(entry: &EntryBody) -> Result<(), String> {
    if entry.sets < 1 {
        return Err("sets must be at least 1".into());
    }
    if entry.reps < 1 {
        return Err("reps must be at least 1".into());
    }
    if !entry.weight_kg.is_finite() || entry.weight_kg < 0.0 {
        return Err("weight_kg must be non-negative".into());
    }
    Ok(())
}

/// Session plus entries land in one transaction: either the whole workout
/// is recorded or none of it is.
#[instrument(skip(state, body))]
pub async fn create_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutDetails>), (StatusCode, String)> {
    validate(&body).map_err(|msg| {
        warn!(%user_id, %msg, "workout rejected");
        (StatusCode::BAD_REQUEST, msg)
    })?;

    let session = WorkoutSession {
        id: Uuid::new_v4(),
        user_id,
        performed_at: body.performed_at.unwrap_or_else(OffsetDateTime::now_utc),
        duration_min: body.duration_min,
        calories_burned: body.calories_burned,
        notes: body.notes.clone(),
    };

    let details = async {
        let mut tx = state.db.begin().await.context("begin tx")?;
        let created = repo::insert_session_tx(&mut tx, &session).await?;
        let mut entries = Vec::with_capacity(body.entries.len());
        for e in &body.entries {
            let entry = WorkoutEntry {
                id: Uuid::new_v4(),
                session_id: created.id,
                exercise_id: e.exercise_id,
                sets: e.sets,
                reps: e.reps,
                weight_kg: e.weight_kg,
                notes: e.notes.clone(),
            };
            repo::insert_entry_tx(&mut tx, &entry).await?;
            entries.push(entry);
        }
        tx.commit().await.context("commit tx")?;
        anyhow::Ok(WorkoutDetails {
            session: created,
            entries,
        })
    }
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(details)))
}

#[instrument(skip(state))]
pub async fn list_workouts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<WorkoutSession>>, (StatusCode, String)> {
    let sessions = repo::list_recent(&state.db, user_id, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(sessions))
}

#[instrument(skip(state))]
pub async fn get_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkoutDetails>, (StatusCode, String)> {
    let (session, entries) = repo::get_with_entries(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Workout not found".to_string()))?;
    Ok(Json(WorkoutDetails { session, entries }))
}

#[instrument(skip(state))]
pub async fn delete_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete_session(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Workout not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_exercises(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<Exercise>>, (StatusCode, String)> {
    let exercises = repo::list_exercises(&state.db).await.map_err(internal)?;
    Ok(Json(exercises))
}

#[instrument(skip(state, body))]
pub async fn create_exercise(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<CreateExerciseRequest>,
) -> Result<(StatusCode, Json<Exercise>), (StatusCode, String)> {
    if body.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".into()));
    }
    let exercise = Exercise {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        category: body.category,
        kind: body.kind,
        video_url: body.video_url,
    };
    let created = repo::insert_exercise(&state.db, &exercise)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sets: i32, reps: i32, weight_kg: f64) -> EntryBody {
        EntryBody {
            exercise_id: Uuid::new_v4(),
            sets,
            reps,
            weight_kg,
            notes: None,
        }
    }

    fn request(entries: Vec<EntryBody>) -> CreateWorkoutRequest {
        CreateWorkoutRequest {
            duration_min: Some(45),
            calories_burned: Some(320),
            notes: None,
            performed_at: None,
            entries,
        }
    }

    #[test]
    fn accepts_valid_workout() {
        assert!(validate(&request(vec![entry(3, 10, 60.0)])).is_ok());
    }

    #[test]
    fn bodyweight_exercise_allows_zero_weight() {
        assert!(validate(&request(vec![entry(3, 12, 0.0)])).is_ok());
    }

    #[test]
    fn rejects_entry_invariant_violations() {
        assert!(validate(&request(vec![entry(0, 10, 60.0)])).is_err());
        assert!(validate(&request(vec![entry(3, 0, 60.0)])).is_err());
        assert!(validate(&request(vec![entry(3, 10, -5.0)])).is_err());
    }

    #[test]
    fn rejects_bad_session_fields() {
        let mut bad = request(vec![]);
        bad.duration_min = Some(0);
        assert!(validate(&bad).is_err());

        let mut bad = request(vec![]);
        bad.calories_burned = Some(-10);
        assert!(validate(&bad).is_err());
    }
}
