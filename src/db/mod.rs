//! Relational store for dashboard collaborators
//!
//! The dashboard's relational features (dam readings CRUD, users,
//! localization) live outside this service; the core only needs three
//! narrow interfaces: a key-value fetch of station records, a mutation
//! recording alert-trigger timestamps, and notification read/write.

pub mod models;
mod alerts;
mod migrations;
mod notifications;
mod stations;

use crate::error::Result;
use chrono::NaiveDateTime;
use models::{Notification, StationRecord, UserAlert};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite store wrapper
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open the store and run migrations
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Station records ==========

    pub fn get_station(&self, id: &str) -> Result<Option<StationRecord>> {
        stations::get_station(&self.conn.lock(), id)
    }

    pub fn upsert_station(&self, record: &StationRecord) -> Result<()> {
        stations::upsert_station(&self.conn.lock(), record)
    }

    pub fn list_stations(&self) -> Result<Vec<StationRecord>> {
        stations::list_stations(&self.conn.lock())
    }

    // ========== User alerts ==========

    pub fn create_alert(&self, alert: &UserAlert) -> Result<i64> {
        alerts::create_alert(&self.conn.lock(), alert)
    }

    pub fn list_alerts_for_station(&self, station_id: &str) -> Result<Vec<UserAlert>> {
        alerts::list_alerts_for_station(&self.conn.lock(), station_id)
    }

    pub fn mark_alert_triggered(&self, alert_id: i64, at: NaiveDateTime) -> Result<()> {
        alerts::mark_alert_triggered(&self.conn.lock(), alert_id, at)
    }

    // ========== Notifications ==========

    pub fn insert_notification(&self, notification: &Notification) -> Result<()> {
        notifications::insert_notification(&self.conn.lock(), notification)
    }

    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        notifications::list_notifications(&self.conn.lock(), user_id)
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<bool> {
        notifications::mark_notification_read(&self.conn.lock(), id)
    }
}
