//! Typed errors for every engine operation.
//!
//! All of these are caller-input errors returned as values; the engine never
//! retries them and never panics on them.

use crate::round::RoundStatus;

/// Error kinds surfaced by the round engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid round config: {0}")]
    InvalidConfig(String),

    #[error("Invalid transition from {from} state")]
    InvalidTransition { from: RoundStatus },

    #[error("Round not found: {0}")]
    RoundNotFound(String),

    #[error("Round is not active")]
    RoundNotActive,

    #[error("User has not joined this round")]
    NotParticipant,

    #[error("Number {number} outside round domain 0..={max}")]
    InvalidNumber { number: u32, max: u32 },

    #[error("Bet amount {amount} outside limits {min}..={max}")]
    InvalidAmount { amount: u64, min: u64, max: u64 },

    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: u64, required: u64 },
}

/// Convenience type alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;
