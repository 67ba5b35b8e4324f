//! Exchange transport and read-only market info.
//!
//! - [`Transport`]: JSON POST primitive ([`HttpTransport`]; `MockTransport`
//!   with the `test-util` feature)
//! - [`MarketInfo`]: asset resolution, mids, positions, spot balances
//! - [`InfoClient`]: `MarketInfo` over the `/info` endpoint

pub mod assets;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod transport;
pub mod user_state;

pub use assets::{AssetTable, MetaResponse, SpotMetaResponse};
pub use client::{InfoClient, MarketInfo};
pub use error::{InfoError, InfoResult, TransportError};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockTransport, RecordedRequest};
pub use transport::{HttpTransport, Transport, EXCHANGE_PATH, INFO_PATH};
pub use user_state::{
    AssetPositionData, AssetPositionEntry, ClearinghouseStateResponse, MarginSummary,
    SpotClearinghouseStateResponse,
};
