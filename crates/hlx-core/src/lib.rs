//! Core domain types for the hlx exchange client.
//!
//! This crate provides the types every other crate builds on:
//! - `Price`, `Size`: precision-safe numeric types and the exchange rounding rules
//! - `OrderRequest`, `OrderKind`, `Cloid`: caller-facing order descriptions
//! - `Network`, `Position`: network selection and account state

pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use decimal::{decimal_to_wire, round_price, usd_to_micros, Price, Size};
pub use error::{CoreError, Result};
pub use market::{
    is_spot_asset, Network, Position, SpotBalance, MAINNET_API_URL, SPOT_ASSET_OFFSET,
    TESTNET_API_URL,
};
pub use order::{
    CancelByCloidRequest, CancelRequest, Cloid, ModifyRequest, OrderKind, OrderRef,
    OrderRequest, TimeInForce, TriggerKind,
};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
