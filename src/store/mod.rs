//! Storage layer for the rewards ledger
//!
//! One SQLite database holds both collaborators the ledger depends on:
//! the mutable per-user progress document and the append-only notification
//! feed. All claim gates are enforced store-side through conditional
//! updates, so concurrent claims for the same user serialize here rather
//! than in application code.

mod db;
mod notifications;
mod progress;

pub use db::LedgerDb;
pub use notifications::NotificationStore;
pub use progress::ProgressStore;
