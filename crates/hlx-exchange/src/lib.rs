//! Action dispatcher for the hlx exchange client.
//!
//! [`Exchange`] is the façade callers use: it resolves coin names through a
//! [`hlx_info::MarketInfo`], encodes and signs through `hlx-signer`, and
//! posts through a [`hlx_info::Transport`].
//!
//! ```text
//! caller ──► Exchange ──► MarketInfo (assets, mids, positions)
//!               │
//!               ├──► Signer (L1 / user-signed / multi-sig)
//!               └──► Transport ──► POST /exchange
//! ```

pub mod config;
pub mod error;
pub mod exchange;

pub use config::ExchangeConfig;
pub use error::{ExchangeError, ExchangeResult};
pub use exchange::{Exchange, MarketOptions};
