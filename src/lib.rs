//! Hydrodash — dam and reservoir telemetry dashboard backend
//!
//! Acquires and normalizes heterogeneous hydrological data: weather-station
//! readings from a third-party telemetry API, windowed range queries
//! against a time-series store, and parsed RCH flat files held in a
//! process-lifetime cache.

pub mod config;
pub mod db;
pub mod error;
pub mod meteo;
pub mod rch;
pub mod server;
pub mod services;
pub mod state;
pub mod tsdb;
