// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidOrderTransition { from: String, to: String },

    #[error("Mite score out of range (0-100): {0}")]
    ScoreOutOfRange(i64),

    #[error("Invalid drying window: start {start} must be before end {end}")]
    InvalidWindow { start: i64, end: i64 },

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
