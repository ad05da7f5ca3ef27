//! User alert records
//!
//! Alert evaluation lives in `services::alerts`; this module only persists
//! subscriptions and trigger timestamps.

use crate::db::models::UserAlert;
use crate::error::{AppError, Result};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn alert_from_row(row: &Row) -> rusqlite::Result<UserAlert> {
    let channels_json: String = row.get(5)?;
    let last_triggered: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;
    Ok(UserAlert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        station_id: row.get(2)?,
        alert_type: row.get(3)?,
        threshold: row.get(4)?,
        channels: serde_json::from_str(&channels_json).unwrap_or_default(),
        last_triggered: last_triggered
            .and_then(|t| NaiveDateTime::parse_from_str(&t, TIME_FMT).ok()),
        created_at: NaiveDateTime::parse_from_str(&created_at, TIME_FMT)
            .unwrap_or_default(),
    })
}

pub fn create_alert(conn: &Connection, alert: &UserAlert) -> Result<i64> {
    conn.execute(
        "INSERT INTO user_alerts (user_id, station_id, alert_type, threshold, channels, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            alert.user_id,
            alert.station_id,
            alert.alert_type,
            alert.threshold,
            serde_json::to_string(&alert.channels)?,
            alert.created_at.format(TIME_FMT).to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_alerts_for_station(conn: &Connection, station_id: &str) -> Result<Vec<UserAlert>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, station_id, alert_type, threshold, channels, last_triggered, created_at
         FROM user_alerts WHERE station_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![station_id], alert_from_row)?;
    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(row?);
    }
    Ok(alerts)
}

pub fn mark_alert_triggered(conn: &Connection, alert_id: i64, at: NaiveDateTime) -> Result<()> {
    let updated = conn.execute(
        "UPDATE user_alerts SET last_triggered = ?1 WHERE id = ?2",
        params![at.format(TIME_FMT).to_string(), alert_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("alert {}", alert_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::db::models::UserAlert;
    use crate::db::Store;
    use chrono::NaiveDate;

    fn sample_alert(station_id: &str) -> UserAlert {
        UserAlert {
            id: 0,
            user_id: "u1".to_string(),
            station_id: station_id.to_string(),
            alert_type: "avgTemp".to_string(),
            threshold: 25.0,
            channels: vec!["email".to_string()],
            last_triggered: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_create_and_list() {
        let store = Store::open_in_memory().unwrap();
        store.create_alert(&sample_alert("93")).unwrap();
        store.create_alert(&sample_alert("94")).unwrap();

        let alerts = store.list_alerts_for_station("93").unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].threshold, 25.0);
        assert_eq!(alerts[0].channels, vec!["email".to_string()]);
        assert!(alerts[0].last_triggered.is_none());
    }

    #[test]
    fn test_trigger_timestamp_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let id = store.create_alert(&sample_alert("93")).unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        store.mark_alert_triggered(id, at).unwrap();

        let alerts = store.list_alerts_for_station("93").unwrap();
        assert_eq!(alerts[0].last_triggered, Some(at));
    }

    #[test]
    fn test_trigger_unknown_alert_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let at = chrono::Utc::now().naive_utc();
        assert!(store.mark_alert_triggered(42, at).is_err());
    }
}
