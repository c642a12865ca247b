use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::auth::{repo::User, AuthUser};
use crate::state::AppState;

use super::repo::{self, Profile, ProfileUpdate};

/// Default daily targets used until the user sets their own. The carbs
/// target is a fixed constant, not user-settable.
pub const DEFAULT_TARGET_CALORIES: f64 = 2200.0;
pub const DEFAULT_TARGET_PROTEIN: f64 = 150.0;
pub const DEFAULT_TARGET_FATS: f64 = 73.0;
pub const TARGET_CARBS: f64 = 275.0;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/targets", get(get_targets))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionTargets {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub sugar: Option<f64>,
}

pub fn targets_for(profile: &Profile) -> NutritionTargets {
    NutritionTargets {
        calories: profile.target_calories.unwrap_or(DEFAULT_TARGET_CALORIES),
        protein: profile.target_protein.unwrap_or(DEFAULT_TARGET_PROTEIN),
        carbs: TARGET_CARBS,
        fats: profile.target_fats.unwrap_or(DEFAULT_TARGET_FATS),
        sugar: profile.target_sugar,
    }
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Profile>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    let profile = repo::get_or_create(&state.db, user_id, &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(profile))
}

#[instrument(skip(state, changes))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(changes): Json<ProfileUpdate>,
) -> Result<Json<Profile>, (StatusCode, String)> {
    if let Some(age) = changes.age {
        if age <= 0 {
            return Err((StatusCode::BAD_REQUEST, "age must be positive".into()));
        }
    }
    if let Some(weight) = changes.weight_kg {
        if !weight.is_finite() || weight <= 0.0 {
            return Err((StatusCode::BAD_REQUEST, "weight_kg must be positive".into()));
        }
    }
    let profile = repo::update(&state.db, user_id, &changes)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Profile not found".to_string()))?;
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn get_targets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NutritionTargets>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    let profile = repo::get_or_create(&state.db, user_id, &user.email)
        .await
        .map_err(internal)?;
    Ok(Json(targets_for(&profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn bare_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: None,
            age: None,
            height_cm: None,
            weight_kg: None,
            fitness_goal: None,
            units_preference: "metric".into(),
            target_calories: None,
            target_protein: None,
            target_fats: None,
            target_sugar: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn targets_fall_back_to_defaults() {
        let t = targets_for(&bare_profile());
        assert_eq!(t.calories, DEFAULT_TARGET_CALORIES);
        assert_eq!(t.protein, DEFAULT_TARGET_PROTEIN);
        assert_eq!(t.fats, DEFAULT_TARGET_FATS);
        assert_eq!(t.carbs, TARGET_CARBS);
        assert_eq!(t.sugar, None);
    }

    #[test]
    fn custom_targets_override_defaults_but_not_carbs() {
        let mut profile = bare_profile();
        profile.target_calories = Some(1800.0);
        profile.target_protein = Some(120.0);
        let t = targets_for(&profile);
        assert_eq!(t.calories, 1800.0);
        assert_eq!(t.protein, 120.0);
        // carbs target is fixed, never user-settable
        assert_eq!(t.carbs, TARGET_CARBS);
    }
}
