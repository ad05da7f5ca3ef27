//! Request handlers
//!
//! Thin adapters between the HTTP surface and the clients: extract
//! parameters, call into `AppState`, wrap the result in the JSON envelope
//! and attach the per-granularity Cache-Control directive.

use crate::error::{AppError, Result};
use crate::meteo::types::{Granularity, STATION_LIST_CACHE_CONTROL};
use crate::rch;
use crate::services::alerts;
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Default trailing window for daily and measurement queries
const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 365;

fn data<T: serde::Serialize>(value: &T) -> Json<serde_json::Value> {
    Json(json!({ "data": value }))
}

fn cached<T: serde::Serialize>(directive: &'static str, value: &T) -> impl IntoResponse {
    ([(header::CACHE_CONTROL, directive)], data(value))
}

// ============================================================================
// Health
// ============================================================================

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "data": { "status": "ok" } }))
}

// ============================================================================
// Station telemetry
// ============================================================================

pub async fn list_stations(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let stations = state.meteo.get_stations().await?;
    Ok(cached(STATION_LIST_CACHE_CONTROL, &stations))
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Resolve an optional inclusive range to concrete dates (trailing window)
fn resolve_range(params: &DateRangeParams) -> Result<(NaiveDate, NaiveDate)> {
    let to = params.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = params
        .from
        .unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS as i64));
    if from > to {
        return Err(AppError::Validation(format!(
            "from {} is after to {}",
            from, to
        )));
    }
    Ok((from, to))
}

pub async fn station_daily(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse> {
    let (from, to) = resolve_range(&params)?;
    let readings = state.meteo.get_daily(&id, from, to).await?;

    // Alert evaluation is collaborator logic; a store failure must not
    // break the telemetry response.
    if let Err(e) = alerts::evaluate_station(&state.store, &id, &readings) {
        warn!("alert evaluation failed for station {}: {}", id, e);
    }

    Ok(cached(Granularity::Daily.cache_control(), &readings))
}

pub async fn station_hourly(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let readings = state.meteo.get_hourly(&id).await?;
    Ok(cached(Granularity::Hourly.cache_control(), &readings))
}

pub async fn station_min10(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let readings = state.meteo.get_min10(&id).await?;
    Ok(cached(Granularity::Min10.cache_control(), &readings))
}

// ============================================================================
// RCH files
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RchParams {
    pub location: Option<String>,
}

/// Location ids double as file names under the RCH directory
fn validate_location(location: &str) -> Result<()> {
    if location.is_empty()
        || location.contains('/')
        || location.contains('\\')
        || location.contains("..")
    {
        return Err(AppError::Validation(format!(
            "invalid location id '{}'",
            location
        )));
    }
    Ok(())
}

/// Cache-aside read of a stored RCH file
pub async fn rch_sample(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RchParams>,
) -> Result<impl IntoResponse> {
    let location = params.location.unwrap_or_else(|| "sample".to_string());
    validate_location(&location)?;

    if let Some(hit) = state.rch_cache.get(&location) {
        return Ok(data(&*hit));
    }

    let file_name = format!("{}.rch", location);
    let path = std::path::Path::new(&state.config.rch_dir).join(&file_name);
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("no RCH file for location {}", location))
        } else {
            AppError::Io(e)
        }
    })?;

    let parsed = rch::parse_named(&content, Some(file_name))?;
    let cached_data = state.rch_cache.set(location, parsed);
    Ok(data(&*cached_data))
}

/// Multipart upload of an RCH file (field `file`, optional field `location`)
pub async fn rch_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut content: Option<(String, Option<String>)> = None;
    let mut location: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable file field: {}", e)))?;
                content = Some((text, file_name));
            }
            Some("location") => {
                location = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (text, file_name) =
        content.ok_or_else(|| AppError::Validation("missing multipart field 'file'".to_string()))?;

    let location = location
        .or_else(|| {
            file_name
                .as_deref()
                .map(|n| n.trim_end_matches(".rch").to_string())
        })
        .ok_or_else(|| AppError::Validation("no location id for upload".to_string()))?;
    validate_location(&location)?;

    let parsed = rch::parse_named(&text, file_name)?;
    let cached_data = state.rch_cache.set(location, parsed);
    Ok(data(&*cached_data))
}

pub async fn rch_invalidate(
    State(state): State<Arc<AppState>>,
    Path(location): Path<String>,
) -> Result<impl IntoResponse> {
    let existed = state.rch_cache.invalidate(&location);
    Ok(data(&json!({ "invalidated": existed })))
}

pub async fn rch_invalidate_all(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let count = state.rch_cache.len();
    state.rch_cache.invalidate_all();
    data(&json!({ "invalidated": count }))
}

// ============================================================================
// Time-series store
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub days: Option<u32>,
}

/// Measurement names are interpolated into the Flux query downstream, so
/// anything outside a plain token alphabet is rejected here.
fn validate_measurement(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::Validation(format!(
            "invalid measurement name '{}'",
            name
        )));
    }
    Ok(())
}

pub async fn measurement_range(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<WindowParams>,
) -> Result<impl IntoResponse> {
    validate_measurement(&name)?;
    let days = params
        .days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .min(MAX_WINDOW_DAYS);
    if days == 0 {
        return Err(AppError::Validation("window must be at least 1 day".to_string()));
    }
    let points = state.tsdb.query_range(&name, days).await?;
    Ok(data(&points))
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    pub user_id: String,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationParams>,
) -> Result<impl IntoResponse> {
    let notifications = state.store.list_notifications(&params.user_id)?;
    Ok(data(&notifications))
}

pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    if !state.store.mark_notification_read(&id)? {
        return Err(AppError::NotFound(format!("notification {}", id)));
    }
    Ok(data(&json!({ "read": true })))
}
