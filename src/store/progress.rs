//! Progress store - the mutable per-user reward document
//!
//! Every eligibility gate is enforced inside the conditional `UPDATE`
//! statements below, so a claim that lost the race against another device
//! matches zero rows instead of double-granting. Grant application and the
//! rank recomputation commit as one transaction.

use rusqlite::OptionalExtension;

use super::db::LedgerDb;
use crate::models::{ActionKind, UserProgress};
use crate::ranks::RankDef;
use crate::schedule::is_milestone;

/// Reads and conditional writes on the `user_progress` table
#[derive(Clone)]
pub struct ProgressStore {
    db: LedgerDb,
}

impl ProgressStore {
    pub fn new(db: LedgerDb) -> Self {
        Self { db }
    }

    /// Create a zeroed progress document; a no-op if the user already has one
    pub fn create(&self, user_id: &str, now: i64) -> rusqlite::Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT OR IGNORE INTO user_progress (user_id, rank_id, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?3)"#,
            rusqlite::params![user_id, RankDef::for_experience(0).id, now],
        )?;
        Ok(())
    }

    /// Load a user's progress document
    pub fn get(&self, user_id: &str) -> rusqlite::Result<Option<UserProgress>> {
        let conn = self.db.conn();
        conn.query_row(
            r#"SELECT user_id, points, experience, rank_id,
                      last_login_day, videos_today, last_video_day,
                      shares_today, last_share_day,
                      likes_received, friends_invited,
                      daily_streak, last_gift_day,
                      created_at, updated_at
               FROM user_progress WHERE user_id = ?1"#,
            [user_id],
            row_to_progress,
        )
        .optional()
    }

    /// Apply a gated grant as one transaction.
    ///
    /// The action's eligibility condition sits in the `WHERE` clause of the
    /// grant statement; `Ok(None)` means the gate was closed at the store
    /// (already claimed, cap reached, or no such user) and nothing changed.
    /// On success the cached rank is recomputed from the new experience
    /// total before the commit, and the new total is returned.
    pub fn apply_grant(
        &self,
        user_id: &str,
        action: ActionKind,
        day: &str,
        cap: i64,
        points: f64,
        xp: i64,
        now: i64,
    ) -> rusqlite::Result<Option<i64>> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let updated = match action {
            ActionKind::DailyLogin => tx.execute(
                GRANT_LOGIN_SQL,
                rusqlite::params![points, xp, day, now, user_id],
            )?,
            ActionKind::DailyGift => tx.execute(
                GRANT_GIFT_SQL,
                rusqlite::params![points, xp, day, now, user_id],
            )?,
            ActionKind::WatchVideo => tx.execute(
                GRANT_VIDEO_SQL,
                rusqlite::params![points, xp, day, now, user_id, cap],
            )?,
            ActionKind::ShareSocial => tx.execute(
                GRANT_SHARE_SQL,
                rusqlite::params![points, xp, day, now, user_id, cap],
            )?,
            ActionKind::InviteFriend => tx.execute(
                GRANT_INVITE_SQL,
                rusqlite::params![points, xp, now, user_id],
            )?,
            // Likes go through apply_like, which counts the like even when
            // no milestone pays out
            ActionKind::LikeMilestone => 0,
        };
        if updated == 0 {
            return Ok(None);
        }

        let experience = refresh_rank(&tx, user_id)?;
        tx.commit()?;
        Ok(Some(experience))
    }

    /// Record a received like and pay the milestone when the new total
    /// lands on one.
    ///
    /// Returns the new like count and whether this like granted; `Ok(None)`
    /// means the user has no progress document.
    pub fn apply_like(
        &self,
        user_id: &str,
        every: i64,
        points: f64,
        xp: i64,
        now: i64,
    ) -> rusqlite::Result<Option<(i64, bool)>> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            REGISTER_LIKE_SQL,
            rusqlite::params![every, points, xp, now, user_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }

        let likes: i64 = tx.query_row(
            "SELECT likes_received FROM user_progress WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        let granted = is_milestone(likes, every);
        if granted {
            refresh_rank(&tx, user_id)?;
        }
        tx.commit()?;
        Ok(Some((likes, granted)))
    }
}

/// Recompute and store the cached rank from the current experience total
fn refresh_rank(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<i64> {
    let experience: i64 = conn.query_row(
        "SELECT experience FROM user_progress WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?;
    let rank = RankDef::for_experience(experience);
    conn.execute(
        "UPDATE user_progress SET rank_id = ?1 WHERE user_id = ?2",
        rusqlite::params![rank.id, user_id],
    )?;
    Ok(experience)
}

fn row_to_progress(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProgress> {
    Ok(UserProgress {
        user_id: row.get(0)?,
        points: row.get(1)?,
        experience: row.get(2)?,
        rank_id: row.get(3)?,
        last_login_day: row.get(4)?,
        videos_today: row.get(5)?,
        last_video_day: row.get(6)?,
        shares_today: row.get(7)?,
        last_share_day: row.get(8)?,
        likes_received: row.get(9)?,
        friends_invited: row.get(10)?,
        daily_streak: row.get(11)?,
        last_gift_day: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

// Gate condition: once per day, keyed on the login anchor
const GRANT_LOGIN_SQL: &str = r#"
UPDATE user_progress
   SET points = ROUND(points + ?1, 2),
       experience = experience + ?2,
       last_login_day = ?3,
       updated_at = ?4
 WHERE user_id = ?5
   AND (last_login_day IS NULL OR last_login_day <> ?3)
"#;

// Gate condition: once per day; every claim advances the streak
const GRANT_GIFT_SQL: &str = r#"
UPDATE user_progress
   SET points = ROUND(points + ?1, 2),
       experience = experience + ?2,
       daily_streak = daily_streak + 1,
       last_gift_day = ?3,
       updated_at = ?4
 WHERE user_id = ?5
   AND (last_gift_day IS NULL OR last_gift_day <> ?3)
"#;

// Gate condition: counter below cap for today; a claim on a new day
// restarts the counter at 1
const GRANT_VIDEO_SQL: &str = r#"
UPDATE user_progress
   SET points = ROUND(points + ?1, 2),
       experience = experience + ?2,
       videos_today = CASE WHEN last_video_day = ?3 THEN videos_today + 1 ELSE 1 END,
       last_video_day = ?3,
       updated_at = ?4
 WHERE user_id = ?5
   AND (last_video_day IS NULL OR last_video_day <> ?3 OR videos_today < ?6)
"#;

const GRANT_SHARE_SQL: &str = r#"
UPDATE user_progress
   SET points = ROUND(points + ?1, 2),
       experience = experience + ?2,
       shares_today = CASE WHEN last_share_day = ?3 THEN shares_today + 1 ELSE 1 END,
       last_share_day = ?3,
       updated_at = ?4
 WHERE user_id = ?5
   AND (last_share_day IS NULL OR last_share_day <> ?3 OR shares_today < ?6)
"#;

// No gate; referrals are unbounded
const GRANT_INVITE_SQL: &str = r#"
UPDATE user_progress
   SET points = ROUND(points + ?1, 2),
       experience = experience + ?2,
       friends_invited = friends_invited + 1,
       updated_at = ?3
 WHERE user_id = ?4
"#;

// Always counts the like; pays only when the new total is a multiple of ?1
const REGISTER_LIKE_SQL: &str = r#"
UPDATE user_progress
   SET likes_received = likes_received + 1,
       points = CASE WHEN (likes_received + 1) % ?1 = 0 THEN ROUND(points + ?2, 2) ELSE points END,
       experience = CASE WHEN (likes_received + 1) % ?1 = 0 THEN experience + ?3 ELSE experience END,
       updated_at = ?4
 WHERE user_id = ?5
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test_rewards.db")).unwrap();
        let store = ProgressStore::new(db);
        store.create("u1", 1000).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let (_dir, store) = open_store();

        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.user_id, "u1");
        assert_eq!(progress.points, 0.0);
        assert_eq!(progress.experience, 0);
        assert_eq!(progress.rank_id, "unranked");
        assert_eq!(progress.last_login_day, None);
        assert_eq!(progress.created_at, 1000);

        // Idempotent re-create keeps the original row
        store.create("u1", 2000).unwrap();
        assert_eq!(store.get("u1").unwrap().unwrap().created_at, 1000);

        assert!(store.get("nobody").unwrap().is_none());
    }

    #[test]
    fn test_login_grant_is_gated_per_day() {
        let (_dir, store) = open_store();

        let first = store
            .apply_grant("u1", ActionKind::DailyLogin, "2026-03-07", 1, 2.0, 50, 1)
            .unwrap();
        assert_eq!(first, Some(50));

        let second = store
            .apply_grant("u1", ActionKind::DailyLogin, "2026-03-07", 1, 2.0, 50, 2)
            .unwrap();
        assert_eq!(second, None);

        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.points, 2.0);
        assert_eq!(progress.experience, 50);
        assert_eq!(progress.last_login_day.as_deref(), Some("2026-03-07"));
    }

    #[test]
    fn test_video_counter_resets_on_new_day() {
        let (_dir, store) = open_store();

        for _ in 0..10 {
            let granted = store
                .apply_grant("u1", ActionKind::WatchVideo, "2026-03-07", 10, 0.5, 50, 1)
                .unwrap();
            assert!(granted.is_some());
        }
        let blocked = store
            .apply_grant("u1", ActionKind::WatchVideo, "2026-03-07", 10, 0.5, 50, 1)
            .unwrap();
        assert_eq!(blocked, None);
        assert_eq!(store.get("u1").unwrap().unwrap().videos_today, 10);

        // New day: counter restarts at 1
        let granted = store
            .apply_grant("u1", ActionKind::WatchVideo, "2026-03-08", 10, 0.5, 50, 2)
            .unwrap();
        assert!(granted.is_some());
        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.videos_today, 1);
        assert_eq!(progress.last_video_day.as_deref(), Some("2026-03-08"));
    }

    #[test]
    fn test_grant_refreshes_cached_rank() {
        let (_dir, store) = open_store();

        let xp = store
            .apply_grant("u1", ActionKind::InviteFriend, "2026-03-07", 0, 5.0, 1200, 1)
            .unwrap();
        assert_eq!(xp, Some(1200));

        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.rank_id, "bronze");
        assert_eq!(progress.friends_invited, 1);
    }

    #[test]
    fn test_apply_like_pays_every_fifth() {
        let (_dir, store) = open_store();

        for expected_likes in 1..=4 {
            let (likes, granted) = store.apply_like("u1", 5, 1.0, 10, 1).unwrap().unwrap();
            assert_eq!(likes, expected_likes);
            assert!(!granted);
        }
        let (likes, granted) = store.apply_like("u1", 5, 1.0, 10, 1).unwrap().unwrap();
        assert_eq!(likes, 5);
        assert!(granted);

        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.points, 1.0);
        assert_eq!(progress.experience, 10);

        assert!(store.apply_like("ghost", 5, 1.0, 10, 1).unwrap().is_none());
    }

    #[test]
    fn test_gift_advances_streak_once_per_day() {
        let (_dir, store) = open_store();

        assert!(store
            .apply_grant("u1", ActionKind::DailyGift, "2026-03-07", 1, 1.0, 0, 1)
            .unwrap()
            .is_some());
        assert!(store
            .apply_grant("u1", ActionKind::DailyGift, "2026-03-07", 1, 2.0, 0, 2)
            .unwrap()
            .is_none());
        assert!(store
            .apply_grant("u1", ActionKind::DailyGift, "2026-03-08", 1, 2.0, 0, 3)
            .unwrap()
            .is_some());

        let progress = store.get("u1").unwrap().unwrap();
        assert_eq!(progress.daily_streak, 2);
        assert_eq!(progress.points, 3.0);
        assert_eq!(progress.last_gift_day.as_deref(), Some("2026-03-08"));
    }
}
