use thiserror::Error;

use crate::domains::matching::models::MatchStatus;
use crate::kernel::store::StoreError;
use crate::kernel::NotifierError;

/// Matching domain errors
#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notifier error: {0}")]
    Notifier(#[from] NotifierError),

    #[error("Match {match_id} cannot move from {from} back to {to}")]
    StatusRegression {
        match_id: String,
        from: MatchStatus,
        to: MatchStatus,
    },

    #[error("Match not found: {0}")]
    MatchNotFound(String),

    #[error("Match already completed: {0}")]
    AlreadyCompleted(String),

    #[error("Invalid pair: {0}")]
    InvalidPair(String),
}

