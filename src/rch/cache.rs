//! In-memory cache of parsed RCH time-series, keyed by location id
//!
//! Process-lifetime and unbounded: each location's file is small and the
//! set of locations is fixed, so there is no eviction or TTL. Invalidation
//! is explicit only. Concurrent misses for the same key may both parse and
//! both set; last writer wins, which is harmless since parses are
//! idempotent.

use crate::rch::parser::RchParsedData;
use dashmap::DashMap;
use std::sync::Arc;

/// Keyed cache of parsed RCH files
#[derive(Default)]
pub struct RchCache {
    entries: DashMap<String, Arc<RchParsedData>>,
}

impl RchCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a previously parsed time-series
    pub fn get(&self, location_id: &str) -> Option<Arc<RchParsedData>> {
        self.entries.get(location_id).map(|e| e.value().clone())
    }

    /// Store a parsed time-series, replacing any previous entry
    pub fn set(&self, location_id: String, data: RchParsedData) -> Arc<RchParsedData> {
        let data = Arc::new(data);
        self.entries.insert(location_id, data.clone());
        data
    }

    /// Drop a single entry; returns whether it existed
    pub fn invalidate(&self, location_id: &str) -> bool {
        self.entries.remove(location_id).is_some()
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
