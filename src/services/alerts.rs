//! Average-temperature alert evaluation
//!
//! Thin collaborator logic: the telemetry clients never call this; the
//! handler layer runs it after a successful daily fetch. For each `avgTemp`
//! alert on the station, the mean of the `temp` metric across the fetched
//! readings is compared against the alert threshold; crossing it records
//! the trigger timestamp and writes a notification.

use crate::db::models::Notification;
use crate::db::Store;
use crate::error::Result;
use crate::meteo::types::StationReading;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Metric name carrying air temperature in normalized readings
const TEMP_METRIC: &str = "temp";

/// Mean of the `temp` metric; readings without it are ignored
pub fn mean_temp(readings: &[StationReading]) -> Option<f64> {
    let temps: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.metrics.get(TEMP_METRIC).copied())
        .collect();
    if temps.is_empty() {
        return None;
    }
    Some(temps.iter().sum::<f64>() / temps.len() as f64)
}

/// Evaluate every alert on a station against fresh readings.
///
/// Returns the number of alerts triggered.
pub fn evaluate_station(
    store: &Store,
    station_id: &str,
    readings: &[StationReading],
) -> Result<usize> {
    let Some(average) = mean_temp(readings) else {
        return Ok(0);
    };

    let now = Utc::now().naive_utc();
    let mut triggered = 0;
    for alert in store.list_alerts_for_station(station_id)? {
        if alert.alert_type != "avgTemp" || average <= alert.threshold {
            continue;
        }
        store.mark_alert_triggered(alert.id, now)?;
        store.insert_notification(&Notification {
            id: Uuid::new_v4().to_string(),
            user_id: alert.user_id.clone(),
            title: format!("Temperature alert for station {}", station_id),
            body: format!(
                "Average temperature {:.1} exceeded threshold {:.1}",
                average, alert.threshold
            ),
            read: false,
            created_at: now,
        })?;
        triggered += 1;
        info!(
            "alert {} triggered for station {} (avg {:.1} > {:.1})",
            alert.id, station_id, average, alert.threshold
        );
    }
    Ok(triggered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UserAlert;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn reading(station: &str, day: u32, temp: Option<f64>) -> StationReading {
        let mut metrics = BTreeMap::new();
        if let Some(t) = temp {
            metrics.insert("temp".to_string(), t);
        }
        StationReading {
            station_id: station.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            metrics,
        }
    }

    fn alert(station: &str, threshold: f64) -> UserAlert {
        UserAlert {
            id: 0,
            user_id: "u1".to_string(),
            station_id: station.to_string(),
            alert_type: "avgTemp".to_string(),
            threshold,
            channels: vec![],
            last_triggered: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_mean_temp_skips_gaps() {
        let readings = vec![
            reading("93", 1, Some(20.0)),
            reading("93", 2, None),
            reading("93", 3, Some(30.0)),
        ];
        assert_eq!(mean_temp(&readings), Some(25.0));
        assert_eq!(mean_temp(&[reading("93", 1, None)]), None);
    }

    #[test]
    fn test_evaluate_triggers_and_notifies() {
        let store = Store::open_in_memory().unwrap();
        store.create_alert(&alert("93", 24.0)).unwrap();
        store.create_alert(&alert("93", 30.0)).unwrap();

        let readings = vec![reading("93", 1, Some(24.0)), reading("93", 2, Some(28.0))];
        let triggered = evaluate_station(&store, "93", &readings).unwrap();
        assert_eq!(triggered, 1);

        let alerts = store.list_alerts_for_station("93").unwrap();
        assert!(alerts[0].last_triggered.is_some());
        assert!(alerts[1].last_triggered.is_none());
        assert_eq!(store.list_notifications("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_no_temp_metric_is_a_noop() {
        let store = Store::open_in_memory().unwrap();
        store.create_alert(&alert("93", 0.0)).unwrap();
        let readings = vec![reading("93", 1, None)];
        assert_eq!(evaluate_station(&store, "93", &readings).unwrap(), 0);
    }
}
