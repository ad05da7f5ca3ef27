//! Application state
//!
//! Constructed once at startup and handed to every request handler; the
//! RCH cache lives here so there is exactly one per process without any
//! module-level global.

use crate::config::Config;
use crate::db::Store;
use crate::error::Result;
use crate::meteo::MeteoClient;
use crate::rch::RchCache;
use crate::tsdb::TsdbClient;
use std::path::Path;
use std::sync::Arc;

/// Shared state for all request handlers
pub struct AppState {
    pub config: Config,
    pub meteo: MeteoClient,
    pub tsdb: TsdbClient,
    pub rch_cache: RchCache,
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(Store::new(Path::new(&config.db_path))?);
        Ok(Self {
            meteo: MeteoClient::new(&config),
            tsdb: TsdbClient::new(&config),
            rch_cache: RchCache::new(),
            store,
            config,
        })
    }
}
