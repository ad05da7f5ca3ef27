//! Environment-driven configuration
//!
//! All settings come from `HYDRODASH_*` environment variables, optionally
//! loaded from a `.env` file at startup. The upstream API token has no
//! default and is required.

use crate::error::{AppError, Result};
use std::env;

/// Runtime configuration, loaded once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP server
    pub bind_addr: String,

    /// Fixed upstream telemetry API endpoint
    pub upstream_url: String,

    /// Authentication token sent with every upstream request
    pub upstream_token: String,

    /// InfluxDB base URL
    pub influx_url: String,
    pub influx_org: String,
    pub influx_token: String,
    pub influx_bucket: String,

    /// SQLite database path
    pub db_path: String,

    /// Directory holding stored RCH files (sample endpoint)
    pub rch_dir: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        let upstream_token = env::var("HYDRODASH_UPSTREAM_TOKEN")
            .map_err(|_| AppError::Config("HYDRODASH_UPSTREAM_TOKEN is not set".to_string()))?;

        Ok(Self {
            bind_addr: var_or("HYDRODASH_BIND", "127.0.0.1:8090"),
            upstream_url: var_or(
                "HYDRODASH_UPSTREAM_URL",
                "https://meteo.example.com/api/data.php",
            ),
            upstream_token,
            influx_url: var_or("HYDRODASH_INFLUX_URL", "http://127.0.0.1:8086"),
            influx_org: var_or("HYDRODASH_INFLUX_ORG", "hydrodash"),
            influx_token: var_or("HYDRODASH_INFLUX_TOKEN", ""),
            influx_bucket: var_or("HYDRODASH_INFLUX_BUCKET", "telemetry"),
            db_path: var_or("HYDRODASH_DB", "hydrodash.db"),
            rch_dir: var_or("HYDRODASH_RCH_DIR", "data/rch"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_or_default() {
        env::remove_var("HYDRODASH_TEST_MISSING");
        assert_eq!(var_or("HYDRODASH_TEST_MISSING", "fallback"), "fallback");
    }
}
