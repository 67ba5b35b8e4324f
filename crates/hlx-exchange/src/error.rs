//! Dispatcher error types.

use hlx_core::CoreError;
use hlx_info::{InfoError, TransportError};
use hlx_signer::SignerError;
use thiserror::Error;

/// Errors surfaced by [`crate::Exchange`].
///
/// Exchange-side rejections are not errors: the raw response is returned.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Malformed request caught before signing.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("No open position for {coin} (user {user})")]
    NoMatchingPosition { coin: String, user: String },

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Info(InfoError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<InfoError> for ExchangeError {
    fn from(err: InfoError) -> Self {
        match err {
            InfoError::UnknownCoin(coin) => Self::UnknownCoin(coin),
            InfoError::Transport(e) => Self::Transport(e),
            other => Self::Info(other),
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Signer(SignerError::from(err))
    }
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;
