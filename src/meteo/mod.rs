//! External station telemetry client
//!
//! Fetches weather/meteo station readings from the upstream telemetry API
//! at three granularities (10-minute, hourly, daily) and reshapes the
//! inconsistent per-station JSON payloads into uniform [`StationReading`]s.

pub mod normalize;
pub mod types;

use crate::config::Config;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use normalize::{normalize_readings, normalize_stations, unwrap_station_payload};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use types::{Granularity, Station, StationReading};

/// Client for the upstream station telemetry API
///
/// Every request is a single form-encoded POST to the fixed endpoint,
/// carrying the auth token, an operation code selecting the granularity,
/// and the station identifier. No retries; one attempt per call.
pub struct MeteoClient {
    client: Client,
    url: String,
    token: String,
}

impl MeteoClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            url: config.upstream_url.clone(),
            token: config.upstream_token.clone(),
        }
    }

    /// List all stations known to the upstream API
    pub async fn get_stations(&self) -> Result<Vec<Station>> {
        let payload = self.request("stations", &[("option", "0")]).await?;
        normalize_stations(&payload)
    }

    /// 10-minute readings for one station
    pub async fn get_min10(&self, station_id: &str) -> Result<Vec<StationReading>> {
        self.fetch_readings(station_id, Granularity::Min10, None)
            .await
    }

    /// Hourly readings for one station
    pub async fn get_hourly(&self, station_id: &str) -> Result<Vec<StationReading>> {
        self.fetch_readings(station_id, Granularity::Hourly, None)
            .await
    }

    /// Daily readings for one station over an inclusive date range
    pub async fn get_daily(
        &self,
        station_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StationReading>> {
        self.fetch_readings(station_id, Granularity::Daily, Some((from, to)))
            .await
    }

    async fn fetch_readings(
        &self,
        station_id: &str,
        granularity: Granularity,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<StationReading>> {
        let mut params: Vec<(&str, String)> = vec![
            ("option", granularity.option_code().to_string()),
            ("id", station_id.to_string()),
        ];
        if let Some((from, to)) = range {
            params.push(("from_date", from.format("%Y-%m-%d").to_string()));
            params.push(("to_date", to.format("%Y-%m-%d").to_string()));
        }
        let param_refs: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let response = self.request(station_id, &param_refs).await?;
        let payload = unwrap_station_payload(&response, station_id)?;
        normalize_readings(station_id, payload)
    }

    /// Issue the form-encoded POST and decode the JSON body
    async fn request(&self, station: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut form: Vec<(&str, &str)> = vec![("token", self.token.as_str())];
        form.extend_from_slice(params);

        debug!("upstream request for {}: {:?}", station, params);

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::UpstreamFetch {
                station: station.to_string(),
                status: e.to_string(),
            })?;

        check_status(station, response.status())?;

        response.json().await.map_err(|e| AppError::UpstreamFetch {
            station: station.to_string(),
            status: format!("invalid JSON body: {}", e),
        })
    }
}

/// Map a non-2xx upstream status to an error carrying the station id
fn check_status(station: &str, status: reqwest::StatusCode) -> Result<()> {
    if !status.is_success() {
        return Err(AppError::UpstreamFetch {
            station: station.to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}
