use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use base64::Engine;
use sqlx::types::Json as Jsonb;
use time::{macros::format_description, Date, Duration, OffsetDateTime, UtcOffset};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::ai::{strip_data_url, types::MealAnalysis};
use crate::auth::AuthUser;
use crate::measurements;
use crate::state::AppState;

use super::dto::{AnalyzeRequest, ComparisonQuery, DayQuery, EntryBody, TrendQuery};
use super::repo::{self, NutritionEntry};
use super::services::{self, MacroTotals, MonthlyComparison, TrendPoint};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/entries", get(list_entries))
        .route("/nutrition/summary", get(daily_summary))
        .route("/nutrition/trend", get(trend))
        .route("/nutrition/monthly-comparison", get(monthly_comparison))
        .route("/nutrition/previous-meals", get(previous_meals))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition/entries", post(create_entry))
        .route(
            "/nutrition/entries/:id",
            put(update_entry).delete(delete_entry),
        )
        .route("/nutrition/analyze", post(analyze_meal))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// The multiply is done in i64: `tz_offset_minutes` comes straight from the
/// query string, and `i32::MAX * 60` would wrap to a small negative offset.
fn parse_offset(minutes: i32) -> Result<UtcOffset, (StatusCode, String)> {
    let invalid = || (StatusCode::BAD_REQUEST, "invalid tz_offset_minutes".to_string());
    let seconds = i32::try_from(i64::from(minutes) * 60).map_err(|_| invalid())?;
    UtcOffset::from_whole_seconds(seconds).map_err(|_| invalid())
}

/// Local calendar day from the query, defaulting to today in that offset.
fn resolve_day(date: &Option<String>, offset: UtcOffset) -> Result<Date, (StatusCode, String)> {
    match date {
        Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| (StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD".into())),
        None => Ok(OffsetDateTime::now_utc().to_offset(offset).date()),
    }
}

/// Half-open [local midnight, next local midnight) interval.
fn day_bounds(
    day: Date,
    offset: UtcOffset,
) -> Result<(OffsetDateTime, OffsetDateTime), (StatusCode, String)> {
    let next = day
        .next_day()
        .ok_or((StatusCode::BAD_REQUEST, "date out of range".into()))?;
    Ok((
        day.midnight().assume_offset(offset),
        next.midnight().assume_offset(offset),
    ))
}

fn entry_from_body(user_id: Uuid, id: Uuid, body: EntryBody) -> Result<NutritionEntry, (StatusCode, String)> {
    let food_items: Vec<String> = body
        .food_items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let macros = MacroTotals {
        calories: body.calories,
        protein: body.protein,
        carbs: body.carbs,
        fats: body.fats,
    };
    services::validate_entry(&food_items, &macros, body.sugar).map_err(|msg| {
        warn!(%user_id, %msg, "meal entry rejected");
        (StatusCode::BAD_REQUEST, msg)
    })?;

    Ok(NutritionEntry {
        id,
        user_id,
        eaten_at: body.eaten_at.unwrap_or_else(OffsetDateTime::now_utc),
        meal_type: body.meal_type,
        food_items: Jsonb(food_items),
        calories: body.calories,
        protein: body.protein,
        carbs: body.carbs,
        fats: body.fats,
        sugar: body.sugar,
        notes: body.notes,
        favorite: body.favorite,
    })
}

#[instrument(skip(state, body))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<EntryBody>,
) -> Result<(StatusCode, Json<NutritionEntry>), (StatusCode, String)> {
    let entry = entry_from_body(user_id, Uuid::new_v4(), body)?;
    let created = repo::insert(&state.db, &entry).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<Vec<NutritionEntry>>, (StatusCode, String)> {
    let offset = parse_offset(q.tz_offset_minutes)?;
    let day = resolve_day(&q.date, offset)?;
    let (from, to) = day_bounds(day, offset)?;
    let entries = repo::list_between(&state.db, user_id, from, to)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

/// Edits are full replacements, never partial patches.
#[instrument(skip(state, body))]
pub async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EntryBody>,
) -> Result<Json<NutritionEntry>, (StatusCode, String)> {
    let entry = entry_from_body(user_id, id, body)?;
    let updated = repo::replace(&state.db, &entry)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Entry not found".to_string()))?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = repo::delete(&state.db, user_id, id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Entry not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<MacroTotals>, (StatusCode, String)> {
    let offset = parse_offset(q.tz_offset_minutes)?;
    let day = resolve_day(&q.date, offset)?;
    let (from, to) = day_bounds(day, offset)?;
    let entries = repo::list_between(&state.db, user_id, from, to)
        .await
        .map_err(internal)?;
    Ok(Json(services::daily_totals(&entries)))
}

#[instrument(skip(state))]
pub async fn trend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TrendQuery>,
) -> Result<Json<Vec<TrendPoint>>, (StatusCode, String)> {
    let offset = parse_offset(q.tz_offset_minutes)?;
    let since = OffsetDateTime::now_utc() - Duration::days(30);

    let points = match q.metric.as_nutrition() {
        Some(metric) => {
            let entries = repo::list_since(&state.db, user_id, since)
                .await
                .map_err(internal)?;
            services::nutrition_trend(&entries, metric, offset)
        }
        None => {
            let rows = measurements::repo::list_since(&state.db, user_id, since)
                .await
                .map_err(internal)?;
            services::weight_trend(&rows, offset)
        }
    };
    Ok(Json(points))
}

#[instrument(skip(state))]
pub async fn monthly_comparison(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ComparisonQuery>,
) -> Result<Json<MonthlyComparison>, (StatusCode, String)> {
    let offset = parse_offset(q.tz_offset_minutes)?;
    let today = OffsetDateTime::now_utc().to_offset(offset).date();
    let window_start = services::comparison_window_start(today)
        .midnight()
        .assume_offset(offset);

    let entries = repo::list_since(&state.db, user_id, window_start)
        .await
        .map_err(internal)?;
    Ok(Json(services::monthly_comparison(
        &entries, q.metric, today, offset,
    )))
}

const PREVIOUS_MEALS_FETCH: i64 = 20;

#[instrument(skip(state))]
pub async fn previous_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<NutritionEntry>>, (StatusCode, String)> {
    let recent = repo::list_recent(&state.db, user_id, PREVIOUS_MEALS_FETCH)
        .await
        .map_err(internal)?;
    Ok(Json(services::dedupe_previous_meals(recent)))
}

/// Proxy to the schema-constrained image-analysis call. Nothing is
/// persisted here; the client decides whether to log the result as a meal.
#[instrument(skip(state, body))]
pub async fn analyze_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<MealAnalysis>, (StatusCode, String)> {
    let image = strip_data_url(&body.image_base64);
    if image.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "image_base64 is required".into()));
    }
    base64::engine::general_purpose::STANDARD
        .decode(image)
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid base64 image data".into()))?;

    let analysis = state
        .completions
        .analyze_meal_image(image)
        .await
        .map_err(|e| {
            warn!(%user_id, error = %e, "meal image analysis failed");
            (StatusCode::BAD_GATEWAY, "Failed to analyze image".into())
        })?;
    Ok(Json(analysis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_are_half_open_local_midnights() {
        let offset = UtcOffset::from_whole_seconds(-5 * 3600).unwrap();
        let day = Date::from_calendar_date(2025, time::Month::March, 10).unwrap();
        let (from, to) = day_bounds(day, offset).unwrap();
        assert_eq!(to - from, Duration::days(1));
        assert_eq!(from.offset(), offset);
        assert_eq!(from.time(), time::Time::MIDNIGHT);
    }

    #[test]
    fn parse_offset_rejects_out_of_range_minutes() {
        // Would wrap to -60 seconds if multiplied in i32.
        assert!(parse_offset(i32::MAX).is_err());
        assert!(parse_offset(i32::MIN).is_err());
        // Fits i32 seconds but is not a real UTC offset.
        assert!(parse_offset(100_000).is_err());

        let offset = parse_offset(-300).unwrap();
        assert_eq!(offset.whole_seconds(), -300 * 60);
        assert_eq!(parse_offset(0).unwrap(), UtcOffset::UTC);
    }

    #[test]
    fn resolve_day_parses_iso_dates() {
        let day = resolve_day(&Some("2025-03-10".into()), UtcOffset::UTC).unwrap();
        assert_eq!(day.to_string(), "2025-03-10");
        assert!(resolve_day(&Some("10/03/2025".into()), UtcOffset::UTC).is_err());
    }
}
