//! Signer error types.

use alloy::primitives::Address;
use hlx_core::CoreError;
use thiserror::Error;

/// Signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Action serialization failed: {0}")]
    SerializationFailed(String),

    /// Wallet capability refused or could not produce a signature.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<rmp_serde::encode::Error> for SignerError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::SerializationFailed(e.to_string())
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationFailed(e.to_string())
    }
}

pub type SignerResult<T> = Result<T, SignerError>;

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
