//! Info and transport error types.

use thiserror::Error;

/// Failure talking to the exchange API.
///
/// Propagated unmodified; nothing in this workspace retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum InfoError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("No mid price for {0}")]
    MissingMid(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type InfoResult<T> = Result<T, InfoError>;
