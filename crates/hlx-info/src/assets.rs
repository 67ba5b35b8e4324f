//! Coin name to asset index table.
//!
//! Built once from `meta` (perpetuals) and `spotMeta` (spot pairs):
//! - perp asset index = position in the `meta` universe
//! - spot asset index = `SPOT_ASSET_OFFSET` + the pair's `index`
//!
//! Spot pairs answer to both their canonical coin name (`@107`, or `PURR/USDC`
//! for the oldest pairs) and a `BASE/QUOTE` alias built from token names.

use std::collections::HashMap;

use hlx_core::SPOT_ASSET_OFFSET;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `meta` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetaResponse {
    pub universe: Vec<PerpAssetMeta>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PerpAssetMeta {
    pub name: String,
    #[serde(rename = "szDecimals")]
    pub sz_decimals: u32,
    #[serde(rename = "maxLeverage", default)]
    pub max_leverage: Option<u32>,
}

/// `spotMeta` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotMetaResponse {
    pub universe: Vec<SpotPairMeta>,
    pub tokens: Vec<SpotTokenMeta>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotPairMeta {
    /// Canonical coin name used by allMids and positions.
    pub name: String,
    /// `[base, quote]` token indices.
    pub tokens: [usize; 2],
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotTokenMeta {
    pub name: String,
    #[serde(rename = "szDecimals")]
    pub sz_decimals: u32,
    pub index: u32,
}

/// Name resolution for every tradable asset.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    /// Canonical coin name -> asset index.
    coin_to_asset: HashMap<String, u32>,
    /// Any accepted name (coin or alias) -> canonical coin name.
    name_to_coin: HashMap<String, String>,
}

impl AssetTable {
    pub fn from_meta(meta: &MetaResponse, spot_meta: &SpotMetaResponse) -> Self {
        let mut table = Self::default();

        for (asset, info) in meta.universe.iter().enumerate() {
            table.insert(&info.name, asset as u32);
        }

        for pair in &spot_meta.universe {
            table.insert(&pair.name, SPOT_ASSET_OFFSET + pair.index);

            let [base, quote] = pair.tokens;
            match (spot_meta.tokens.get(base), spot_meta.tokens.get(quote)) {
                (Some(base), Some(quote)) => {
                    let alias = format!("{}/{}", base.name, quote.name);
                    table
                        .name_to_coin
                        .entry(alias)
                        .or_insert_with(|| pair.name.clone());
                }
                _ => warn!(pair = %pair.name, tokens = ?pair.tokens, "Spot pair references unknown token"),
            }
        }

        table
    }

    fn insert(&mut self, coin: &str, asset: u32) {
        self.coin_to_asset.insert(coin.to_string(), asset);
        self.name_to_coin.insert(coin.to_string(), coin.to_string());
    }

    /// Canonical coin name for `name` (identity for canonical names).
    pub fn coin(&self, name: &str) -> Option<&str> {
        self.name_to_coin.get(name).map(String::as_str)
    }

    /// Asset index for a coin name or alias.
    pub fn asset(&self, name: &str) -> Option<u32> {
        self.coin(name)
            .and_then(|coin| self.coin_to_asset.get(coin))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.coin_to_asset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coin_to_asset.is_empty()
    }
}
