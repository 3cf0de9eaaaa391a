//! Error type for ledger operations
//!
//! Claim rejections (`AlreadyClaimed`, `LimitReached`) are ordinary values
//! inside [`crate::models::ClaimOutcome`]; this type covers the failures the
//! caller cannot treat as a routine outcome.

/// Error type for ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No progress row exists for the user; registration happens elsewhere
    #[error("no progress record for user {0}")]
    UnknownUser(String),

    /// The stored progress document failed validation; the claim fails
    /// closed instead of guess-repairing the row
    #[error("stored progress for user {user} is invalid: {reason}")]
    InvalidState { user: String, reason: String },

    /// The underlying store round-trip failed; the grant must not be
    /// assumed to have happened
    #[error("reward store unavailable: {0}")]
    Store(#[from] rusqlite::Error),
}
