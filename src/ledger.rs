//! Rewards ledger - core claim logic
//!
//! Owns the conversion of user actions into point/experience grants,
//! the rejection of over-limit claims, rank recomputation, and the
//! notification append for each grant. Constructed once at application
//! start and passed by reference to the UI layer; there is no ambient
//! global state.

use chrono::Utc;

use crate::config::LedgerConfig;
use crate::day;
use crate::error::LedgerError;
use crate::models::{ActionKind, ClaimOutcome, NotificationRecord, RewardEvent, UserProgress};
use crate::ranks::{self, RankProgress};
use crate::schedule::{self, ClaimRule, LIKE_MILESTONE_EVERY, Period};
use crate::store::{LedgerDb, NotificationStore, ProgressStore};

/// Main entry point for all reward operations
#[derive(Clone)]
pub struct RewardsLedger {
    progress: ProgressStore,
    notifications: NotificationStore,
}

impl RewardsLedger {
    /// Create a ledger on an already-opened database
    pub fn new(db: LedgerDb) -> Self {
        Self {
            progress: ProgressStore::new(db.clone()),
            notifications: NotificationStore::new(db),
        }
    }

    /// Open the database named by `config` and build a ledger on it
    pub fn open(config: &LedgerConfig) -> anyhow::Result<Self> {
        let db = LedgerDb::open(&config.db_path)?;
        Ok(Self::new(db))
    }

    /// Current timestamp in milliseconds
    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ========================================
    // ACCOUNT LIFECYCLE
    // ========================================

    /// Create a zeroed progress document for a new user; idempotent
    pub fn register_user(&self, user_id: &str) -> Result<(), LedgerError> {
        self.progress.create(user_id, Self::now_ms())?;
        Ok(())
    }

    /// Load and validate a user's progress document
    pub fn progress(&self, user_id: &str) -> Result<UserProgress, LedgerError> {
        self.load(user_id)
    }

    /// Rank, next rank, and progress fraction for a user
    pub fn rank_progress(&self, user_id: &str) -> Result<RankProgress, LedgerError> {
        let progress = self.load(user_id)?;
        Ok(ranks::rank_progress(progress.experience))
    }

    // ========================================
    // CLAIM OPERATIONS
    // ========================================

    /// Claim the once-per-day login bonus
    pub fn claim_daily_login(&self, user_id: &str) -> Result<ClaimOutcome, LedgerError> {
        self.claim_on(user_id, ActionKind::DailyLogin, &day::today_string())
    }

    /// Claim a watched-video reward (capped per day)
    pub fn watch_video(&self, user_id: &str) -> Result<ClaimOutcome, LedgerError> {
        self.claim_on(user_id, ActionKind::WatchVideo, &day::today_string())
    }

    /// Claim a social-share reward (capped per day)
    pub fn share_on_social(&self, user_id: &str) -> Result<ClaimOutcome, LedgerError> {
        self.claim_on(user_id, ActionKind::ShareSocial, &day::today_string())
    }

    /// Claim the once-per-day streak gift
    pub fn claim_daily_gift(&self, user_id: &str) -> Result<ClaimOutcome, LedgerError> {
        self.claim_on(user_id, ActionKind::DailyGift, &day::today_string())
    }

    /// Grant the referral bonus; referrals are unbounded
    pub fn invite_friend(&self, user_id: &str) -> Result<ClaimOutcome, LedgerError> {
        self.claim_on(user_id, ActionKind::InviteFriend, &day::today_string())
    }

    /// Claim an action for an explicit local day.
    ///
    /// The public claim methods call this with today's day string; callers
    /// that replay or simulate days (and the test suite) pass their own.
    /// Like milestones are not day-scheduled; use [`Self::register_like`].
    pub fn claim_on(
        &self,
        user_id: &str,
        action: ActionKind,
        claim_day: &str,
    ) -> Result<ClaimOutcome, LedgerError> {
        let progress = self.load(user_id)?;
        let rule = ClaimRule::for_action(action);

        // Pure gate pass for the precise rejection reason; the store's
        // conditional update re-checks the same condition authoritatively
        if let Err(rejection) = schedule::check_gate(rule, &progress, claim_day) {
            return Ok(ClaimOutcome::Rejected(rejection));
        }

        let (points, xp) = schedule::compute_payout(rule, &progress);
        let cap = match rule.period {
            Period::Daily { cap } => cap,
            _ => 0,
        };
        let now = Self::now_ms();

        match self
            .progress
            .apply_grant(user_id, action, claim_day, cap, points, xp, now)?
        {
            Some(_) => {
                let event = RewardEvent {
                    action,
                    points,
                    xp,
                    timestamp: now,
                };
                self.notify_grant(user_id, &event);
                tracing::debug!(
                    "Granted {} to {}: +{} points, +{} xp",
                    action.as_str(),
                    user_id,
                    points,
                    xp
                );
                Ok(ClaimOutcome::Granted(event))
            }
            // Another device won the race between our read and the
            // conditional update; classify against fresh state
            None => self.classify_conflict(user_id, rule, claim_day),
        }
    }

    /// Record a received like; every 5th like pays the milestone.
    ///
    /// A non-milestone like is a successful no-grant, not a rejection.
    pub fn register_like(&self, user_id: &str) -> Result<Option<RewardEvent>, LedgerError> {
        let progress = self.load(user_id)?;

        let rule = ClaimRule::for_action(ActionKind::LikeMilestone);
        let (points, xp) = schedule::compute_payout(rule, &progress);
        let now = Self::now_ms();

        let Some((likes, granted)) =
            self.progress
                .apply_like(user_id, LIKE_MILESTONE_EVERY, points, xp, now)?
        else {
            return Err(LedgerError::UnknownUser(user_id.to_string()));
        };

        if !granted {
            return Ok(None);
        }
        let event = RewardEvent {
            action: ActionKind::LikeMilestone,
            points,
            xp,
            timestamp: now,
        };
        self.notify_grant(user_id, &event);
        tracing::debug!("Like milestone for {} at {} likes", user_id, likes);
        Ok(Some(event))
    }

    // ========================================
    // NOTIFICATION FEED
    // ========================================

    /// A user's most recent notifications, newest first
    pub fn notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, LedgerError> {
        Ok(self.notifications.list(user_id, limit)?)
    }

    /// Count of unread notifications
    pub fn unread_count(&self, user_id: &str) -> Result<i64, LedgerError> {
        Ok(self.notifications.unread_count(user_id)?)
    }

    /// Mark a single notification read
    pub fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<bool, LedgerError> {
        Ok(self.notifications.mark_read(user_id, notification_id)?)
    }

    /// Mark all of a user's notifications read
    pub fn mark_all_read(&self, user_id: &str) -> Result<usize, LedgerError> {
        Ok(self.notifications.mark_all_read(user_id)?)
    }

    // ========================================
    // INTERNALS
    // ========================================

    fn load(&self, user_id: &str) -> Result<UserProgress, LedgerError> {
        let Some(progress) = self.progress.get(user_id)? else {
            return Err(LedgerError::UnknownUser(user_id.to_string()));
        };
        if let Err(reason) = progress.validate() {
            return Err(LedgerError::InvalidState {
                user: user_id.to_string(),
                reason,
            });
        }
        Ok(progress)
    }

    /// Append the grant notification; best-effort, strictly after the
    /// grant committed. A failed append is logged and never surfaced.
    fn notify_grant(&self, user_id: &str, event: &RewardEvent) {
        let message = grant_message(event);
        let data = serde_json::to_value(event).ok();
        if let Err(e) = self.notifications.append(
            user_id,
            event.action.as_str(),
            &message,
            data.as_ref(),
            event.timestamp,
        ) {
            tracing::warn!(
                "Failed to append grant notification for {}: {}",
                user_id,
                e
            );
        }
    }

    /// The conditional update matched no row even though the loaded state
    /// passed the gate: re-read and classify against fresh state.
    fn classify_conflict(
        &self,
        user_id: &str,
        rule: &ClaimRule,
        claim_day: &str,
    ) -> Result<ClaimOutcome, LedgerError> {
        let progress = self.load(user_id)?;
        match schedule::check_gate(rule, &progress, claim_day) {
            Err(rejection) => Ok(ClaimOutcome::Rejected(rejection)),
            // Fresh state says eligible but the store refused: fail closed
            Ok(()) => Err(LedgerError::InvalidState {
                user: user_id.to_string(),
                reason: "conditional grant matched no row".to_string(),
            }),
        }
    }
}

/// Human-readable one-line summary of a grant for the notification feed
fn grant_message(event: &RewardEvent) -> String {
    let prefix = match event.action {
        ActionKind::DailyLogin => "Daily login bonus",
        ActionKind::WatchVideo => "Video reward",
        ActionKind::ShareSocial => "Share reward",
        ActionKind::LikeMilestone => "Like milestone",
        ActionKind::InviteFriend => "Referral bonus",
        ActionKind::DailyGift => "Daily gift",
    };
    if event.xp > 0 {
        format!("{}: +{} points, +{} XP", prefix, event.points, event.xp)
    } else {
        format!("{}: +{} points", prefix, event.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_message_names_the_amounts() {
        let event = RewardEvent {
            action: ActionKind::DailyLogin,
            points: 2.0,
            xp: 50,
            timestamp: 0,
        };
        assert_eq!(grant_message(&event), "Daily login bonus: +2 points, +50 XP");

        let event = RewardEvent {
            action: ActionKind::WatchVideo,
            points: 0.64,
            xp: 50,
            timestamp: 0,
        };
        assert_eq!(grant_message(&event), "Video reward: +0.64 points, +50 XP");

        // Zero-xp grants skip the XP clause
        let event = RewardEvent {
            action: ActionKind::DailyGift,
            points: 8.0,
            xp: 0,
            timestamp: 0,
        };
        assert_eq!(grant_message(&event), "Daily gift: +8 points");
    }
}
