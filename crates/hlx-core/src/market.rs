//! Asset indices, network selection, and account state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Price, Size};

/// Production API base URL.
///
/// The network flag used in every signature is derived by comparing the
/// configured base URL against this constant, never against a literal.
pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";

/// Test network API base URL.
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

/// First spot asset index (spot index 0 = 10000).
pub const SPOT_ASSET_OFFSET: u32 = 10_000;

/// First builder-deployed perp asset index.
///
/// Formula: 100000 + perp_dex_id * 10000 + asset_index
pub const BUILDER_PERP_ASSET_OFFSET: u32 = 100_000;

/// Whether an asset index belongs to a spot market.
#[inline]
pub fn is_spot_asset(asset: u32) -> bool {
    (SPOT_ASSET_OFFSET..BUILDER_PERP_ASSET_OFFSET).contains(&asset)
}

/// Which deployment a signature targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Derive the network from a base URL.
    ///
    /// Only an exact match with [`MAINNET_API_URL`] selects mainnet; a
    /// trailing slash is tolerated. Anything else signs for the test network.
    pub fn from_base_url(base_url: &str) -> Self {
        if base_url.trim_end_matches('/') == MAINNET_API_URL {
            Self::Mainnet
        } else {
            Self::Testnet
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Phantom agent source for L1 signatures: "a" (mainnet) or "b" (testnet).
    pub fn l1_source(&self) -> &'static str {
        if self.is_mainnet() {
            "a"
        } else {
            "b"
        }
    }

    /// `hyperliquidChain` value for user-signed actions.
    pub fn chain_name(&self) -> &'static str {
        match self {
            Self::Mainnet => "Mainnet",
            Self::Testnet => "Testnet",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_API_URL,
            Self::Testnet => TESTNET_API_URL,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.chain_name())
    }
}

/// Open perpetual position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub coin: String,
    /// Signed size: positive = long, negative = short.
    pub size: Decimal,
    pub entry_price: Option<Price>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.size > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.size < Decimal::ZERO
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_zero()
    }

    /// Unsigned size of the position.
    pub fn abs_size(&self) -> Size {
        Size::new(self.size.abs())
    }
}

/// Spot token balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotBalance {
    pub coin: String,
    pub total: Decimal,
    pub hold: Decimal,
}

impl SpotBalance {
    pub fn available(&self) -> Decimal {
        self.total - self.hold
    }
}
