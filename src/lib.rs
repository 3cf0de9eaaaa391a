//! Glint rewards ledger
//!
//! Converts discrete user actions (daily login, video watch, social share,
//! referral, received likes) into points and experience grants under
//! per-action claim limits, derives a rank from an experience threshold
//! table, and appends a notification record for every grant.
//!
//! Claim limits are enforced at the store through conditional updates, so
//! concurrent claims for the same user from multiple devices serialize
//! there; rejections (`AlreadyClaimed`, `LimitReached`) come back as
//! ordinary outcomes, never as errors.
//!
//! # Usage
//!
//! ```ignore
//! let ledger = RewardsLedger::open(&LedgerConfig::default())?;
//! ledger.register_user("user-1")?;
//!
//! match ledger.claim_daily_login("user-1")? {
//!     ClaimOutcome::Granted(event) => println!("+{} points", event.points),
//!     ClaimOutcome::Rejected(reason) => println!("{}", reason.label()),
//! }
//! ```

pub mod config;
pub mod day;
pub mod error;
pub mod ledger;
pub mod models;
pub mod ranks;
pub mod schedule;
pub mod store;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::RewardsLedger;
pub use models::{
    ActionKind, ClaimOutcome, NotificationRecord, Rejection, RewardEvent, UserProgress,
};
pub use ranks::{RANKS, RankDef, RankProgress};
pub use store::LedgerDb;
