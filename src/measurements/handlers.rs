use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::profile;
use crate::state::AppState;

use super::repo::{self, Measurement};

pub fn routes() -> Router<AppState> {
    Router::new().route("/measurements", get(list_measurements).post(add_measurement))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Debug, Deserialize)]
pub struct MeasurementBody {
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub chest_cm: Option<f64>,
    pub waist_cm: Option<f64>,
    pub arm_cm: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_limit() -> i64 {
    30
}

fn validate(body: &MeasurementBody) -> Result<(), String> {
    if body.weight_kg.is_none()
        && body.body_fat_pct.is_none()
        && body.chest_cm.is_none()
        && body.waist_cm.is_none()
        && body.arm_cm.is_none()
    {
        return Err("at least one measurement value is required".into());
    }
    if let Some(w) = body.weight_kg {
        if !w.is_finite() || w <= 0.0 {
            return Err("weight_kg must be positive".into());
        }
    }
    if let Some(bf) = body.body_fat_pct {
        if !bf.is_finite() || !(0.0..=100.0).contains(&bf) {
            return Err("body_fat_pct must be between 0 and 100".into());
        }
    }
    Ok(())
}

#[instrument(skip(state, body))]
pub async fn add_measurement(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<MeasurementBody>,
) -> Result<(StatusCode, Json<Measurement>), (StatusCode, String)> {
    validate(&body).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let measurement = Measurement {
        id: Uuid::new_v4(),
        user_id,
        measured_at: OffsetDateTime::now_utc(),
        weight_kg: body.weight_kg,
        body_fat_pct: body.body_fat_pct,
        chest_cm: body.chest_cm,
        waist_cm: body.waist_cm,
        arm_cm: body.arm_cm,
    };
    let created = repo::insert(&state.db, &measurement)
        .await
        .map_err(internal)?;

    // A logged weight also becomes the profile's current weight.
    if let Some(weight) = created.weight_kg {
        profile::repo::set_weight(&state.db, user_id, weight)
            .await
            .map_err(internal)?;
    }

    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn list_measurements(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Measurement>>, (StatusCode, String)> {
    let rows = repo::list_recent(&state.db, user_id, q.limit)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}
