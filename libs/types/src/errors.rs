//! Error taxonomy shared by the engine and the HTTP boundary
//!
//! Every rejection the core can produce maps to exactly one kind; the
//! gateway translates kinds into HTTP status codes.

use thiserror::Error;

/// Rejection produced by the exchange core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient collateral for resulting exposure")]
    InsufficientCollateral,

    #[error("operation forbidden for this user")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("order would match against the submitter's own order")]
    SelfMatch,

    #[error("trading window for this contract has not opened")]
    TooEarly,

    #[error("trading window for this contract has closed")]
    TooLate,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl ExchangeError {
    /// Stable machine-readable kind slug used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::InvalidInput(_) => "invalid_input",
            ExchangeError::Unauthorized(_) => "unauthorized",
            ExchangeError::InsufficientCollateral => "insufficient_collateral",
            ExchangeError::Forbidden => "forbidden",
            ExchangeError::NotFound(_) => "not_found",
            ExchangeError::SelfMatch => "self_match",
            ExchangeError::TooEarly => "too_early",
            ExchangeError::TooLate => "too_late",
            ExchangeError::Conflict(_) => "conflict",
        }
    }
}
