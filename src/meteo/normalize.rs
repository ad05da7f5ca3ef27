//! Normalization of upstream station payloads
//!
//! The upstream API is inconsistent in two independent ways:
//!
//! - The response is sometimes keyed by station id (`{ "93": {...} }`) and
//!   sometimes the payload is the top-level object itself.
//! - The per-station payload is either an array of row objects, each with
//!   its own timestamp field, or a map from timestamp string to metric
//!   object. Metric values arrive as numbers or numeric strings.
//!
//! Everything here reduces those shapes to ordered [`StationReading`]s.

use crate::error::{AppError, Result};
use crate::meteo::types::{Station, StationReading};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field names the upstream uses for a row's timestamp, in priority order
const TIME_FIELDS: &[&str] = &["dt", "date", "datetime", "time"];

/// Unwrap the odd response keying.
///
/// If the top-level mapping contains a key equal to the requested station
/// id, that nested value is the payload; otherwise the top-level value is
/// used directly. The check is made only against the requested id, which is
/// the documented upstream contract; a payload that happens to carry a
/// field named after *another* station id is unaffected.
pub fn unwrap_station_payload<'a>(response: &'a Value, station_id: &str) -> Result<&'a Value> {
    let payload = match response {
        Value::Object(map) if map.contains_key(station_id) => &map[station_id],
        other => other,
    };

    let empty = match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(rows) => rows.is_empty(),
        _ => true,
    };
    if empty {
        return Err(AppError::StationNotFound(station_id.to_string()));
    }
    Ok(payload)
}

/// Reduce an unwrapped payload to readings ordered by ascending timestamp
pub fn normalize_readings(station_id: &str, payload: &Value) -> Result<Vec<StationReading>> {
    let mut readings = match payload {
        Value::Array(rows) => rows
            .iter()
            .filter_map(|row| normalize_row(station_id, row))
            .collect::<Vec<_>>(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, fields)| {
                let timestamp = parse_timestamp(key)?;
                Some(StationReading {
                    station_id: station_id.to_string(),
                    timestamp,
                    metrics: collect_metrics(fields),
                })
            })
            .collect(),
        _ => {
            return Err(AppError::StationNotFound(station_id.to_string()));
        }
    };

    // Map iteration order is lexicographic over keys, array order is the
    // upstream's choice; neither is guaranteed chronological.
    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}

/// Normalize the station-list payload (`{ id: {...} }` or an array)
pub fn normalize_stations(payload: &Value) -> Result<Vec<Station>> {
    let stations = match payload {
        Value::Object(map) => map
            .iter()
            .map(|(id, body)| Station {
                id: id.clone(),
                name: station_name(body),
            })
            .collect(),
        Value::Array(rows) => rows
            .iter()
            .filter_map(|row| {
                let id = row.get("id").and_then(value_to_string)?;
                Some(Station {
                    id,
                    name: station_name(row),
                })
            })
            .collect(),
        _ => {
            return Err(AppError::Validation(
                "unexpected station list payload".to_string(),
            ))
        }
    };
    Ok(stations)
}

fn station_name(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(value_to_string),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One array-shaped row; rows without a parsable timestamp are dropped
fn normalize_row(station_id: &str, row: &Value) -> Option<StationReading> {
    let fields = row.as_object()?;

    let (time_key, timestamp) = TIME_FIELDS.iter().find_map(|key| {
        let raw = fields.get(*key)?;
        let text = value_to_string(raw)?;
        Some((*key, parse_timestamp(&text)?))
    })?;

    let mut metrics = BTreeMap::new();
    for (key, value) in fields {
        if key == time_key {
            continue;
        }
        if let Some(number) = coerce_f64(value) {
            metrics.insert(key.clone(), number);
        }
    }

    Some(StationReading {
        station_id: station_id.to_string(),
        timestamp,
        metrics,
    })
}

fn collect_metrics(fields: &Value) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    if let Value::Object(map) = fields {
        for (key, value) in map {
            if let Some(number) = coerce_f64(value) {
                metrics.insert(key.clone(), number);
            }
        }
    }
    metrics
}

/// Accept JSON numbers and numeric strings; drop everything else
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Timestamp formats observed across stations
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}
