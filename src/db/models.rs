//! Store models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Key-value station record (dashboard metadata, not telemetry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub river: Option<String>,
    /// Free-form JSON blob owned by the dashboard
    pub meta: Option<String>,
}

/// A user's alert subscription on a station
///
/// Owned by the alert collaborator; the core only records trigger
/// timestamps. `alert_type` is currently always `avgTemp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAlert {
    pub id: i64,
    pub user_id: String,
    pub station_id: String,
    pub alert_type: String,
    pub threshold: f64,
    pub channels: Vec<String>,
    pub last_triggered: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// User-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}
