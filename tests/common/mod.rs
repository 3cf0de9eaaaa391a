//! Shared test utilities for ledger integration tests

use glint_rewards::{LedgerDb, RewardsLedger};
use tempfile::TempDir;

pub const USER: &str = "user-1";

/// Open a ledger backed by a temp database with one registered user
pub fn open_ledger() -> (TempDir, RewardsLedger) {
    let (dir, _db, ledger) = open_ledger_with_db();
    (dir, ledger)
}

/// Same as [`open_ledger`], keeping a database handle for tests that poke
/// at rows directly
pub fn open_ledger_with_db() -> (TempDir, LedgerDb, RewardsLedger) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("glint_rewards=debug")
        .try_init();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = LedgerDb::open(&temp_dir.path().join("rewards.db")).expect("Failed to open db");
    let ledger = RewardsLedger::new(db.clone());
    ledger.register_user(USER).expect("Failed to register user");
    (temp_dir, db, ledger)
}

/// Deterministic local-day string for simulated day `n`
pub fn day(n: u32) -> String {
    format!("2026-03-{:02}", n)
}
