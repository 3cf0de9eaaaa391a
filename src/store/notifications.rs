//! Notification store - append-only per-user feed
//!
//! Rows are written once per grant and never mutated afterwards except the
//! `read` flag. The feed is display data for the UI; losing an append never
//! affects the grant it describes.

use uuid::Uuid;

use super::db::LedgerDb;
use crate::models::NotificationRecord;

/// Appends to and reads from the `notifications` table
#[derive(Clone)]
pub struct NotificationStore {
    db: LedgerDb,
}

impl NotificationStore {
    pub fn new(db: LedgerDb) -> Self {
        Self { db }
    }

    /// Append a notification and return the stored record
    pub fn append(
        &self,
        user_id: &str,
        kind: &str,
        message: &str,
        data: Option<&serde_json::Value>,
        now: i64,
    ) -> rusqlite::Result<NotificationRecord> {
        let id = Uuid::new_v4().to_string();
        let payload = data.map(|d| d.to_string());

        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO notifications (id, user_id, kind, message, data, read, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)"#,
            rusqlite::params![id, user_id, kind, message, payload, now],
        )?;

        Ok(NotificationRecord {
            id,
            kind: kind.to_string(),
            message: message.to_string(),
            data: data.cloned(),
            read: false,
            created_at: now,
        })
    }

    /// List a user's most recent notifications, newest first
    pub fn list(&self, user_id: &str, limit: usize) -> rusqlite::Result<Vec<NotificationRecord>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"SELECT id, kind, message, data, read, created_at
               FROM notifications
               WHERE user_id = ?1
               ORDER BY created_at DESC, id DESC
               LIMIT ?2"#,
        )?;
        let records = stmt
            .query_map(rusqlite::params![user_id, limit as i64], |row| {
                Ok(NotificationRecord {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    message: row.get(2)?,
                    data: row
                        .get::<_, Option<String>>(3)?
                        .and_then(|raw| serde_json::from_str(&raw).ok()),
                    read: row.get::<_, i64>(4)? != 0,
                    created_at: row.get(5)?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Count of unread notifications
    pub fn unread_count(&self, user_id: &str) -> rusqlite::Result<i64> {
        let conn = self.db.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
            [user_id],
            |r| r.get(0),
        )
    }

    /// Mark a single notification read; returns false if it doesn't exist
    pub fn mark_read(&self, user_id: &str, id: &str) -> rusqlite::Result<bool> {
        let conn = self.db.conn();
        let updated = conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND id = ?2",
            rusqlite::params![user_id, id],
        )?;
        Ok(updated > 0)
    }

    /// Mark all of a user's notifications read; returns how many flipped
    pub fn mark_all_read(&self, user_id: &str) -> rusqlite::Result<usize> {
        let conn = self.db.conn();
        conn.execute(
            "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
            [user_id],
        )
    }
}
