//! Claim schedule engine
//!
//! One parameterized rule table drives every reward action: the period
//! defines the eligibility gate, the payout defines the granted amounts.
//! The gate here is evaluated against an already-loaded progress row to
//! classify rejections; the authoritative copy of the same condition lives
//! in the store's conditional update.

use crate::day::same_day;
use crate::models::{ActionKind, Rejection, UserProgress};

/// How often an action can be claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Up to `cap` claims per local day, counter resets on day change
    Daily { cap: i64 },
    /// Triggers on every `every`-th occurrence of a cumulative counter
    EveryNth { every: i64 },
    /// No gate at all
    Unbounded,
}

/// What a successful claim pays out
#[derive(Debug, Clone, Copy)]
pub enum Payout {
    /// Fixed points and experience
    Fixed { points: f64, xp: i64 },
    /// Points drawn uniformly from [min, max] rounded to 2 decimals,
    /// fixed experience
    RandomPoints { min: f64, max: f64, xp: i64 },
    /// Points from a rolling slot table indexed by the advanced streak,
    /// no experience
    StreakTable { slots: &'static [f64] },
}

/// A single action's claim rule
#[derive(Debug, Clone, Copy)]
pub struct ClaimRule {
    pub action: ActionKind,
    pub period: Period,
    pub payout: Payout,
}

/// Every 5th received like pays the milestone
pub const LIKE_MILESTONE_EVERY: i64 = 5;

/// Escalating daily gift amounts; slot = ((streak - 1) mod 7) after the
/// claim advances the streak
pub static GIFT_SLOTS: &[f64] = &[1.0, 2.0, 3.0, 5.0, 8.0, 12.0, 20.0];

/// All claim rules (one per action)
pub static RULES: &[ClaimRule] = &[
    ClaimRule {
        action: ActionKind::DailyLogin,
        period: Period::Daily { cap: 1 },
        payout: Payout::Fixed {
            points: 2.0,
            xp: 50,
        },
    },
    ClaimRule {
        action: ActionKind::WatchVideo,
        period: Period::Daily { cap: 10 },
        payout: Payout::RandomPoints {
            min: 0.2,
            max: 1.0,
            xp: 50,
        },
    },
    ClaimRule {
        action: ActionKind::ShareSocial,
        period: Period::Daily { cap: 5 },
        payout: Payout::Fixed {
            points: 10.0,
            xp: 10,
        },
    },
    ClaimRule {
        action: ActionKind::LikeMilestone,
        period: Period::EveryNth {
            every: LIKE_MILESTONE_EVERY,
        },
        payout: Payout::Fixed {
            points: 1.0,
            xp: 10,
        },
    },
    ClaimRule {
        action: ActionKind::InviteFriend,
        period: Period::Unbounded,
        payout: Payout::Fixed {
            points: 5.0,
            xp: 100,
        },
    },
    ClaimRule {
        action: ActionKind::DailyGift,
        period: Period::Daily { cap: 1 },
        payout: Payout::StreakTable { slots: GIFT_SLOTS },
    },
];

impl ClaimRule {
    /// Look up the rule for an action
    pub fn for_action(action: ActionKind) -> &'static ClaimRule {
        RULES
            .iter()
            .find(|r| r.action == action)
            .expect("every action has a rule")
    }
}

/// Evaluate the eligibility gate for `rule` against a loaded progress row.
///
/// Only daily periods can reject; cumulative and unbounded actions are
/// always allowed through (the milestone condition applies to the payout,
/// not the gate). No mutation happens here.
pub fn check_gate(rule: &ClaimRule, progress: &UserProgress, day: &str) -> Result<(), Rejection> {
    match rule.period {
        Period::Daily { cap } => {
            let (anchor, count) = progress.day_counter(rule.action);
            if !same_day(anchor, day) {
                // New day, counter resets on the claim itself
                return Ok(());
            }
            if cap == 1 {
                Err(Rejection::AlreadyClaimed)
            } else if count >= cap {
                Err(Rejection::LimitReached)
            } else {
                Ok(())
            }
        }
        Period::EveryNth { .. } | Period::Unbounded => Ok(()),
    }
}

/// Compute the payout for a claim that passed the gate.
///
/// The random roll happens here, before anything touches the store.
pub fn compute_payout(rule: &ClaimRule, progress: &UserProgress) -> (f64, i64) {
    match rule.payout {
        Payout::Fixed { points, xp } => (points, xp),
        Payout::RandomPoints { min, max, xp } => (roll_points(min, max), xp),
        Payout::StreakTable { slots } => {
            // The claim advances the streak by 1; pay the resulting slot
            let slot = (progress.daily_streak % slots.len() as i64) as usize;
            (slots[slot], 0)
        }
    }
}

/// Whether a cumulative counter value sits on a milestone
pub fn is_milestone(count: i64, every: i64) -> bool {
    count > 0 && count % every == 0
}

/// Round a point amount to 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Draw a uniform point amount from [min, max], rounded to 2 decimals
pub fn roll_points(min: f64, max: f64) -> f64 {
    let mut bytes = [0u8; 8];
    let seed = if getrandom::getrandom(&mut bytes).is_ok() {
        u64::from_le_bytes(bytes)
    } else {
        // Fallback: best-effort entropy if the OS RNG is unavailable.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let pid = std::process::id() as u128;
        (nanos ^ pid.rotate_left(17)) as u64
    };

    // 53 high bits give a uniform fraction in [0, 1)
    let unit = (seed >> 11) as f64 / (1u64 << 53) as f64;
    round2(min + unit * (max - min))
}
