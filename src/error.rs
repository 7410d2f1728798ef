//! Error types for the ledger core.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{EntryType, Platform};

/// Reasons a new parlay is rejected before anything is stored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("a parlay needs at least 2 picks, got {count}")]
    TooFewPicks { count: usize },

    #[error("{platform} allows at most {max} picks, got {count}")]
    TooManyPicks { platform: Platform, max: usize, count: usize },

    #[error("{entry_type} entries need at least {min} picks, got {count}")]
    EntryTooSmall { entry_type: EntryType, min: usize, count: usize },

    #[error("{platform} does not offer {entry_type} entries")]
    EntryTypeNotOffered { platform: Platform, entry_type: EntryType },

    #[error("stake must be positive, got {0}")]
    NonPositiveStake(Decimal),

    #[error("multiplier must be positive, got {0}")]
    NonPositiveMultiplier(Decimal),

    #[error("pick {index} is missing a {field}")]
    MissingPickField { index: usize, field: &'static str },

    #[error("stake {stake} at {multiplier}x is too large to settle")]
    PayoutOverflow { stake: Decimal, multiplier: Decimal },
}

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parlay not found: {0}")]
    ParlayNotFound(Uuid),

    #[error("Pick not found: {0}")]
    PickNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt ledger record: {0}")]
    Corrupt(String),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::ParlayNotFound(_) | LedgerError::PickNotFound(_))
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
