//! Key-value station records

use crate::db::models::StationRecord;
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub fn get_station(conn: &Connection, id: &str) -> Result<Option<StationRecord>> {
    let record = conn
        .query_row(
            "SELECT id, name, river, meta FROM stations WHERE id = ?1",
            params![id],
            |row| {
                Ok(StationRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    river: row.get(2)?,
                    meta: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

pub fn upsert_station(conn: &Connection, record: &StationRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO stations (id, name, river, meta) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = ?2, river = ?3, meta = ?4",
        params![record.id, record.name, record.river, record.meta],
    )?;
    Ok(())
}

pub fn list_stations(conn: &Connection) -> Result<Vec<StationRecord>> {
    let mut stmt = conn.prepare("SELECT id, name, river, meta FROM stations ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(StationRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            river: row.get(2)?,
            meta: row.get(3)?,
        })
    })?;
    let mut stations = Vec::new();
    for row in rows {
        stations.push(row?);
    }
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use crate::db::models::StationRecord;
    use crate::db::Store;

    #[test]
    fn test_upsert_and_get() {
        let store = Store::open_in_memory().unwrap();
        let record = StationRecord {
            id: "93".to_string(),
            name: "Orava".to_string(),
            river: Some("Orava".to_string()),
            meta: None,
        };
        store.upsert_station(&record).unwrap();
        assert_eq!(store.get_station("93").unwrap(), Some(record.clone()));

        // Upsert replaces
        let renamed = StationRecord {
            name: "Orava dam".to_string(),
            ..record
        };
        store.upsert_station(&renamed).unwrap();
        assert_eq!(store.get_station("93").unwrap().unwrap().name, "Orava dam");
        assert_eq!(store.list_stations().unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_station("nope").unwrap().is_none());
    }
}
