//! Notification read/write

use crate::db::models::Notification;
use crate::error::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_notification(conn: &Connection, notification: &Notification) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, title, body, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            notification.id,
            notification.user_id,
            notification.title,
            notification.body,
            notification.read as i32,
            notification.created_at.format(TIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn list_notifications(conn: &Connection, user_id: &str) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, body, read, created_at
         FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        let created_at: String = row.get(5)?;
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            read: row.get::<_, i32>(4)? == 1,
            created_at: NaiveDateTime::parse_from_str(&created_at, TIME_FMT)
                .unwrap_or_default(),
        })
    })?;
    let mut notifications = Vec::new();
    for row in rows {
        notifications.push(row?);
    }
    Ok(notifications)
}

pub fn mark_notification_read(conn: &Connection, id: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use crate::db::models::Notification;
    use crate::db::Store;
    use chrono::NaiveDate;

    fn sample(id: &str, user: &str) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: user.to_string(),
            title: "Temperature alert".to_string(),
            body: "Average temperature exceeded 25".to_string(),
            read: false,
            created_at: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let store = Store::open_in_memory().unwrap();
        store.insert_notification(&sample("n1", "u1")).unwrap();
        store.insert_notification(&sample("n2", "u2")).unwrap();

        let list = store.list_notifications("u1").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "n1");
        assert!(!list[0].read);
    }

    #[test]
    fn test_mark_read() {
        let store = Store::open_in_memory().unwrap();
        store.insert_notification(&sample("n1", "u1")).unwrap();
        assert!(store.mark_notification_read("n1").unwrap());
        assert!(store.list_notifications("u1").unwrap()[0].read);
        assert!(!store.mark_notification_read("missing").unwrap());
    }
}
