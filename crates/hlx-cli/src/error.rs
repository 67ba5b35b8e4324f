//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Key error: {0}")]
    Key(#[from] hlx_signer::KeyError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] hlx_exchange::ExchangeError),

    #[error("Info error: {0}")]
    Info(#[from] hlx_info::InfoError),

    #[error("Transport error: {0}")]
    Transport(#[from] hlx_info::TransportError),

    #[error("Invalid argument: {0}")]
    Core(#[from] hlx_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
