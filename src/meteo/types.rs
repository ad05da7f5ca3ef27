//! Station telemetry types

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// One entry of the upstream station list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: Option<String>,
}

/// Normalized telemetry sample
///
/// Distinct station payloads use inconsistent field names and nesting;
/// normalization maps them all onto this shape. Granularity is a query
/// parameter, not a stored attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReading {
    pub station_id: String,
    pub timestamp: NaiveDateTime,
    pub metrics: BTreeMap<String, f64>,
}

/// Query granularity for station readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Min10,
    Hourly,
    Daily,
}

impl Granularity {
    /// Upstream operation code selecting this granularity
    pub fn option_code(&self) -> &'static str {
        match self {
            Granularity::Min10 => "1",
            Granularity::Hourly => "2",
            Granularity::Daily => "3",
        }
    }

    /// Cache-Control directive for responses at this granularity.
    ///
    /// 10-minute data tolerates ~100 minutes of staleness, daily data half
    /// a day; hourly data is served near-real-time and never cached.
    pub fn cache_control(&self) -> &'static str {
        match self {
            Granularity::Min10 => "public, max-age=6000, stale-while-revalidate=600",
            Granularity::Hourly => "no-store",
            Granularity::Daily => "public, max-age=43200, stale-while-revalidate=21600",
        }
    }
}

/// Cache-Control directive for the station list itself
pub const STATION_LIST_CACHE_CONTROL: &str =
    "public, max-age=86400, stale-while-revalidate=43200";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_codes() {
        assert_eq!(Granularity::Min10.option_code(), "1");
        assert_eq!(Granularity::Hourly.option_code(), "2");
        assert_eq!(Granularity::Daily.option_code(), "3");
    }

    #[test]
    fn test_hourly_is_not_cached() {
        assert_eq!(Granularity::Hourly.cache_control(), "no-store");
    }
}
