//! Schema setup
//!
//! Exact migration history is owned by the dashboard; this service only
//! ensures the tables it touches exist.

use crate::error::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS stations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            river TEXT,
            meta TEXT
        );

        CREATE TABLE IF NOT EXISTS user_alerts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            station_id TEXT NOT NULL,
            alert_type TEXT NOT NULL DEFAULT 'avgTemp',
            threshold REAL NOT NULL,
            channels TEXT NOT NULL DEFAULT '[]',
            last_triggered TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_user_alerts_station
            ON user_alerts (station_id);

        CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications (user_id, created_at);
        "#,
    )?;
    Ok(())
}
