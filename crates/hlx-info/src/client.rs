//! Read-only market info client.
//!
//! Resolves coin names to asset indices and fetches mids, positions, and
//! spot balances from the `/info` endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use hlx_core::{is_spot_asset, BoxFuture, Position, Price, SpotBalance};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::assets::{AssetTable, MetaResponse, SpotMetaResponse};
use crate::error::{InfoError, InfoResult};
use crate::transport::{Transport, INFO_PATH};
use crate::user_state::{ClearinghouseStateResponse, SpotClearinghouseStateResponse};

/// Market lookups the exchange dispatcher depends on.
pub trait MarketInfo: Send + Sync {
    /// Asset index for a coin name or spot alias.
    fn name_to_asset(&self, name: &str) -> Option<u32>;

    fn is_spot(&self, asset: u32) -> bool {
        is_spot_asset(asset)
    }

    /// Current mid price for a coin name or spot alias.
    fn mid_price<'a>(&'a self, name: &'a str) -> BoxFuture<'a, InfoResult<Price>>;

    /// Open perpetual positions of `user` (0x address).
    fn user_positions<'a>(&'a self, user: &'a str) -> BoxFuture<'a, InfoResult<Vec<Position>>>;

    fn spot_balances<'a>(&'a self, user: &'a str)
        -> BoxFuture<'a, InfoResult<Vec<SpotBalance>>>;
}

/// Request body for the info endpoint.
#[derive(Debug, Serialize)]
struct InfoRequest<'a> {
    #[serde(rename = "type")]
    request_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

impl<'a> InfoRequest<'a> {
    fn new(request_type: &'a str) -> Self {
        Self {
            request_type,
            user: None,
        }
    }

    fn for_user(request_type: &'a str, user: &'a str) -> Self {
        Self {
            request_type,
            user: Some(user),
        }
    }
}

/// [`MarketInfo`] backed by the `/info` endpoint.
pub struct InfoClient {
    transport: Arc<dyn Transport>,
    assets: RwLock<AssetTable>,
}

impl InfoClient {
    /// Create a client and load the asset table.
    pub async fn connect(transport: Arc<dyn Transport>) -> InfoResult<Self> {
        let client = Self::with_assets(transport, AssetTable::default());
        client.refresh_assets().await?;
        Ok(client)
    }

    /// Create a client with a pre-built asset table.
    pub fn with_assets(transport: Arc<dyn Transport>, assets: AssetTable) -> Self {
        Self {
            transport,
            assets: RwLock::new(assets),
        }
    }

    /// Reload `meta` and `spotMeta`.
    pub async fn refresh_assets(&self) -> InfoResult<()> {
        let meta = self.meta().await?;
        let spot_meta = self.spot_meta().await?;
        let table = AssetTable::from_meta(&meta, &spot_meta);

        info!(
            perps = meta.universe.len(),
            spot_pairs = spot_meta.universe.len(),
            "Loaded asset table"
        );
        *self.assets.write() = table;
        Ok(())
    }

    async fn post_info<T: DeserializeOwned>(&self, request: InfoRequest<'_>) -> InfoResult<T> {
        debug!(request_type = request.request_type, "Info request");
        let body = serde_json::to_value(&request)?;
        let response = self.transport.post_json(INFO_PATH, body).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn meta(&self) -> InfoResult<MetaResponse> {
        self.post_info(InfoRequest::new("meta")).await
    }

    pub async fn spot_meta(&self) -> InfoResult<SpotMetaResponse> {
        self.post_info(InfoRequest::new("spotMeta")).await
    }

    /// Mid prices keyed by canonical coin name, as returned (strings).
    pub async fn all_mids(&self) -> InfoResult<HashMap<String, String>> {
        self.post_info(InfoRequest::new("allMids")).await
    }

    pub async fn clearinghouse_state(&self, user: &str) -> InfoResult<ClearinghouseStateResponse> {
        self.post_info(InfoRequest::for_user("clearinghouseState", user))
            .await
    }

    pub async fn spot_clearinghouse_state(
        &self,
        user: &str,
    ) -> InfoResult<SpotClearinghouseStateResponse> {
        self.post_info(InfoRequest::for_user("spotClearinghouseState", user))
            .await
    }

    fn coin_for(&self, name: &str) -> InfoResult<String> {
        self.assets
            .read()
            .coin(name)
            .map(str::to_string)
            .ok_or_else(|| InfoError::UnknownCoin(name.to_string()))
    }
}

impl MarketInfo for InfoClient {
    fn name_to_asset(&self, name: &str) -> Option<u32> {
        self.assets.read().asset(name)
    }

    fn mid_price<'a>(&'a self, name: &'a str) -> BoxFuture<'a, InfoResult<Price>> {
        Box::pin(async move {
            let coin = self.coin_for(name)?;
            let mids = self.all_mids().await?;
            let raw = mids
                .get(&coin)
                .ok_or_else(|| InfoError::MissingMid(coin.clone()))?;
            let mid: Decimal = raw
                .parse()
                .map_err(|e| InfoError::ParseError(format!("mid {coin}={raw}: {e}")))?;
            Ok(Price::new(mid))
        })
    }

    fn user_positions<'a>(&'a self, user: &'a str) -> BoxFuture<'a, InfoResult<Vec<Position>>> {
        Box::pin(async move { self.clearinghouse_state(user).await?.positions() })
    }

    fn spot_balances<'a>(
        &'a self,
        user: &'a str,
    ) -> BoxFuture<'a, InfoResult<Vec<SpotBalance>>> {
        Box::pin(async move { self.spot_clearinghouse_state(user).await?.balances() })
    }
}
