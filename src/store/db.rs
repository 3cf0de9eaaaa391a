//! SQLite database connection and schema management for the rewards ledger
//!
//! Manages the `~/.glint/rewards.db` database with automatic schema
//! migration. The database holds the per-user progress documents and the
//! append-only notification feed.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config;

/// Database wrapper shared by the progress and notification stores
#[derive(Clone)]
pub struct LedgerDb {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl LedgerDb {
    /// Open or create the rewards database at the default location
    /// (~/.glint/rewards.db)
    pub fn open_default() -> Result<Self> {
        let db_path = config::data_dir().join("rewards.db");
        Self::open(&db_path)
    }

    /// Open or create the rewards database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open rewards db: {}", path.display()))?;

        // WAL mode keeps claims from multiple app processes serialized
        // without blocking readers
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection (for queries)
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Rewards DB lock poisoned")
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        // Get current schema version
        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        // Migration 2: daily gift streak columns (shipped after the first
        // progress schema; older databases lack them)
        if version < 2 {
            let has_daily_streak: bool = conn
                .prepare(
                    "SELECT COUNT(*) FROM pragma_table_info('user_progress') WHERE name = 'daily_streak'",
                )
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_daily_streak {
                conn.execute_batch(
                    r#"
                    ALTER TABLE user_progress ADD COLUMN daily_streak INTEGER NOT NULL DEFAULT 0;
                    ALTER TABLE user_progress ADD COLUMN last_gift_day TEXT;
                    "#,
                )?;
            }

            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }
}

/// SQL schema for the rewards database
const SCHEMA_SQL: &str = r#"
-- One mutable progress document per user
CREATE TABLE IF NOT EXISTS user_progress (
    user_id TEXT PRIMARY KEY,
    points REAL NOT NULL DEFAULT 0,
    experience INTEGER NOT NULL DEFAULT 0,
    rank_id TEXT NOT NULL DEFAULT 'unranked',
    last_login_day TEXT,
    videos_today INTEGER NOT NULL DEFAULT 0,
    last_video_day TEXT,
    shares_today INTEGER NOT NULL DEFAULT 0,
    last_share_day TEXT,
    likes_received INTEGER NOT NULL DEFAULT 0,
    friends_invited INTEGER NOT NULL DEFAULT 0,
    daily_streak INTEGER NOT NULL DEFAULT 0,
    last_gift_day TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Append-only per-user notification feed
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    message TEXT NOT NULL,
    data TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_and_init() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test_rewards.db");
        let db = LedgerDb::open(&db_path).unwrap();

        // Verify tables exist
        let conn = db.conn();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"user_progress".to_string()));
        assert!(tables.contains(&"notifications".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_migration_from_v1_preserves_balances() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("old_rewards.db");

        // Build a v1 database by hand: no streak columns yet
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE user_progress (
                    user_id TEXT PRIMARY KEY,
                    points REAL NOT NULL DEFAULT 0,
                    experience INTEGER NOT NULL DEFAULT 0,
                    rank_id TEXT NOT NULL DEFAULT 'unranked',
                    last_login_day TEXT,
                    videos_today INTEGER NOT NULL DEFAULT 0,
                    last_video_day TEXT,
                    shares_today INTEGER NOT NULL DEFAULT 0,
                    last_share_day TEXT,
                    likes_received INTEGER NOT NULL DEFAULT 0,
                    friends_invited INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE schema_version (version INTEGER PRIMARY KEY);
                INSERT INTO schema_version VALUES (1);
                INSERT INTO user_progress (user_id, points, experience, rank_id, created_at, updated_at)
                VALUES ('u1', 12.5, 1200, 'bronze', 1, 1);
                "#,
            )
            .unwrap();
        }

        let db = LedgerDb::open(&db_path).unwrap();
        let conn = db.conn();

        let (points, streak): (f64, i64) = conn
            .query_row(
                "SELECT points, daily_streak FROM user_progress WHERE user_id = 'u1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!((points - 12.5).abs() < 1e-9);
        assert_eq!(streak, 0);

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }
}
