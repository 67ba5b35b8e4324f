//! Error types for hlx-core.

use thiserror::Error;

/// Core validation errors.
///
/// All of these are raised before any signing or network work happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid cloid format: {0} (expected 0x followed by 32 hex digits)")]
    InvalidCloidFormat(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Value {0} cannot be represented with 8 decimal places")]
    PrecisionLoss(String),

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
