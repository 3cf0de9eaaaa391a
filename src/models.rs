//! Data models for the rewards ledger
//!
//! These structures represent the data stored in and returned from the
//! progress and notification stores.

use serde::{Deserialize, Serialize};

/// A claimable (or system-triggered) reward action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    DailyLogin,
    WatchVideo,
    ShareSocial,
    LikeMilestone,
    InviteFriend,
    DailyGift,
}

impl ActionKind {
    /// Get the string ID for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyLogin => "daily-login",
            Self::WatchVideo => "watch-video",
            Self::ShareSocial => "share-social",
            Self::LikeMilestone => "like-milestone",
            Self::InviteFriend => "invite-friend",
            Self::DailyGift => "daily-gift",
        }
    }

    /// Parse from database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily-login" => Some(Self::DailyLogin),
            "watch-video" => Some(Self::WatchVideo),
            "share-social" => Some(Self::ShareSocial),
            "like-milestone" => Some(Self::LikeMilestone),
            "invite-friend" => Some(Self::InviteFriend),
            "daily-gift" => Some(Self::DailyGift),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DailyLogin => "Daily Login",
            Self::WatchVideo => "Video Watched",
            Self::ShareSocial => "Social Share",
            Self::LikeMilestone => "Like Milestone",
            Self::InviteFriend => "Friend Invited",
            Self::DailyGift => "Daily Gift",
        }
    }
}

/// One user's progress document
///
/// Created zeroed at registration and mutated exclusively through the
/// ledger's claim operations. Day anchors hold the local-day string
/// (`YYYY-MM-DD`) of the last claim; counters use storage-width integers so
/// a corrupt row can be detected instead of silently wrapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,

    /// Redeemable currency balance, rounded to 2 decimals
    pub points: f64,
    /// Monotonically non-decreasing progression metric
    pub experience: i64,
    /// Cached rank, recomputed from `experience` on every grant
    pub rank_id: String,

    // Per-day claim anchors and counters
    pub last_login_day: Option<String>,
    pub videos_today: i64,
    pub last_video_day: Option<String>,
    pub shares_today: i64,
    pub last_share_day: Option<String>,

    // Cumulative counters, never reset
    pub likes_received: i64,
    pub friends_invited: i64,

    // Daily gift streak state
    pub daily_streak: i64,
    pub last_gift_day: Option<String>,

    // Timestamps (ms since epoch)
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProgress {
    /// Check the stored document for states the ledger must never act on.
    ///
    /// Returns a human-readable reason on failure; the caller fails the
    /// claim closed rather than repairing the row.
    pub fn validate(&self) -> Result<(), String> {
        if !self.points.is_finite() || self.points < 0.0 {
            return Err(format!("negative or non-finite points: {}", self.points));
        }
        if self.experience < 0 {
            return Err(format!("negative experience: {}", self.experience));
        }
        for (name, value) in [
            ("videos_today", self.videos_today),
            ("shares_today", self.shares_today),
            ("likes_received", self.likes_received),
            ("friends_invited", self.friends_invited),
            ("daily_streak", self.daily_streak),
        ] {
            if value < 0 {
                return Err(format!("negative counter {}: {}", name, value));
            }
        }
        for (name, anchor) in [
            ("last_login_day", &self.last_login_day),
            ("last_video_day", &self.last_video_day),
            ("last_share_day", &self.last_share_day),
            ("last_gift_day", &self.last_gift_day),
        ] {
            if let Some(day) = anchor {
                if crate::day::parse_day(day).is_none() {
                    return Err(format!("unparseable day anchor {}: {}", name, day));
                }
            }
        }
        Ok(())
    }

    /// The day anchor and per-day counter gating `action`, if it has one
    pub fn day_counter(&self, action: ActionKind) -> (Option<&str>, i64) {
        match action {
            ActionKind::DailyLogin => (self.last_login_day.as_deref(), 1),
            ActionKind::WatchVideo => (self.last_video_day.as_deref(), self.videos_today),
            ActionKind::ShareSocial => (self.last_share_day.as_deref(), self.shares_today),
            ActionKind::DailyGift => (self.last_gift_day.as_deref(), 1),
            ActionKind::LikeMilestone | ActionKind::InviteFriend => (None, 0),
        }
    }
}

/// The value produced by each successful claim
///
/// Not persisted as its own entity; a JSON copy rides on the grant's
/// notification record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEvent {
    pub action: ActionKind,
    pub points: f64,
    pub xp: i64,
    pub timestamp: i64,
}

/// Why a claim was turned away without mutating anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Same-day re-claim of a once-per-day action
    AlreadyClaimed,
    /// Per-day cap exhausted
    LimitReached,
}

impl Rejection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyClaimed => "already claimed today",
            Self::LimitReached => "daily limit reached",
        }
    }
}

/// Result of a claim operation
///
/// Rejections are routine user-facing outcomes, not errors; store failures
/// surface separately as [`crate::LedgerError`].
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Granted(RewardEvent),
    Rejected(Rejection),
}

impl ClaimOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The grant event, if one happened
    pub fn event(&self) -> Option<&RewardEvent> {
        match self {
            Self::Granted(event) => Some(event),
            Self::Rejected(_) => None,
        }
    }
}

/// A row in the per-user notification feed
///
/// Appended once per grant, never mutated except the `read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub kind: String,
    pub message: String,
    /// Structured copy of the triggering event, when one exists
    pub data: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: i64,
}
