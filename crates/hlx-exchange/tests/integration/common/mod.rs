//! Shared fixtures: scripted market info, frozen clock, test wallet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use hlx_core::{BoxFuture, Position, Price, SpotBalance};
use hlx_exchange::{Exchange, ExchangeConfig};
use hlx_info::{
    InfoClient, InfoError, InfoResult, MarketInfo, MockTransport, EXCHANGE_PATH, INFO_PATH,
};
use hlx_signer::{Clock, NonceManager};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Well-known test private key (DO NOT use in production).
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Frozen clock value; nonces are `BASE_MS + 1`, `BASE_MS + 2`, ...
pub const BASE_MS: u64 = 1_700_000_000_000;

pub const ETH_ASSET: u32 = 4;
pub const PURR_ASSET: u32 = 10_000;

pub fn test_wallet() -> Arc<PrivateKeySigner> {
    Arc::new(TEST_PRIVATE_KEY.parse::<PrivateKeySigner>().unwrap())
}

/// Clock that never moves.
pub struct FrozenClock(pub u64);

impl Clock for FrozenClock {
    fn now_ms(&self) -> u64 {
        self.0
    }
}

/// Market info with fixed assets, mids, and positions.
///
/// Counts position lookups and remembers which user was asked for.
#[derive(Default)]
pub struct ScriptedInfo {
    assets: HashMap<String, u32>,
    mids: HashMap<String, Price>,
    positions: Mutex<Vec<Position>>,
    position_lookups: AtomicUsize,
    last_user: Mutex<Option<String>>,
}

impl ScriptedInfo {
    pub fn new() -> Self {
        let mut info = Self::default();
        info.assets.insert("ETH".to_string(), ETH_ASSET);
        info.assets.insert("PURR/USDC".to_string(), PURR_ASSET);
        info
    }

    pub fn with_mid(mut self, coin: &str, mid: Price) -> Self {
        self.mids.insert(coin.to_string(), mid);
        self
    }

    pub fn set_positions(&self, positions: Vec<Position>) {
        *self.positions.lock() = positions;
    }

    pub fn position_lookups(&self) -> usize {
        self.position_lookups.load(Ordering::SeqCst)
    }

    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().clone()
    }
}

impl MarketInfo for ScriptedInfo {
    fn name_to_asset(&self, name: &str) -> Option<u32> {
        self.assets.get(name).copied()
    }

    fn mid_price<'a>(&'a self, name: &'a str) -> BoxFuture<'a, InfoResult<Price>> {
        Box::pin(async move {
            self.mids
                .get(name)
                .copied()
                .ok_or_else(|| InfoError::MissingMid(name.to_string()))
        })
    }

    fn user_positions<'a>(&'a self, user: &'a str) -> BoxFuture<'a, InfoResult<Vec<Position>>> {
        Box::pin(async move {
            self.position_lookups.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock() = Some(user.to_string());
            Ok(self.positions.lock().clone())
        })
    }

    fn spot_balances<'a>(
        &'a self,
        _user: &'a str,
    ) -> BoxFuture<'a, InfoResult<Vec<SpotBalance>>> {
        Box::pin(async move { Ok(Vec::new()) })
    }
}

/// Everything a dispatcher test needs.
pub struct Harness {
    pub exchange: Exchange,
    pub transport: Arc<MockTransport>,
    pub info: Arc<ScriptedInfo>,
    pub wallet: Arc<PrivateKeySigner>,
}

impl Harness {
    pub fn new(base_url: &str, info: ScriptedInfo, config: ExchangeConfig) -> Self {
        let transport = Arc::new(MockTransport::new(base_url));
        transport.respond(EXCHANGE_PATH, ok_response());
        let info = Arc::new(info);
        let wallet = test_wallet();

        let exchange = Exchange::new(wallet.clone(), transport.clone(), info.clone(), &config)
            .unwrap()
            .with_nonce_source(Arc::new(NonceManager::new(FrozenClock(BASE_MS))));

        Self {
            exchange,
            transport,
            info,
            wallet,
        }
    }

    /// Testnet harness with default config.
    pub fn testnet(info: ScriptedInfo) -> Self {
        Self::new(hlx_core::TESTNET_API_URL, info, ExchangeConfig::default())
    }

    /// Bodies posted to `/exchange`, oldest first.
    pub fn posted(&self) -> Vec<Value> {
        self.transport
            .requests_to(EXCHANGE_PATH)
            .into_iter()
            .map(|r| r.body)
            .collect()
    }

    pub fn last_posted(&self) -> Value {
        self.posted().pop().unwrap()
    }
}

pub fn ok_response() -> Value {
    json!({"status": "ok", "response": {"type": "default"}})
}

/// Dispatcher backed by a real [`InfoClient`], so info lookups show up as
/// recorded `/info` requests. Recorded requests start out empty.
pub async fn info_client_exchange() -> (Exchange, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::default());
    transport.respond_info(
        "meta",
        json!({"universe": [{"name": "BTC", "szDecimals": 5}, {"name": "ETH", "szDecimals": 4}]}),
    );
    transport.respond_info("spotMeta", json!({"universe": [], "tokens": []}));
    transport.respond_info("allMids", json!({"BTC": "65000", "ETH": "100"}));
    transport.respond_info("clearinghouseState", json!({"assetPositions": []}));
    transport.respond(EXCHANGE_PATH, ok_response());

    let info = Arc::new(InfoClient::connect(transport.clone()).await.unwrap());
    let exchange = Exchange::new(
        test_wallet(),
        transport.clone(),
        info,
        &ExchangeConfig::default(),
    )
    .unwrap()
    .with_nonce_source(Arc::new(NonceManager::new(FrozenClock(BASE_MS))));

    transport.clear_requests();
    (exchange, transport)
}

/// Number of `/info` queries recorded.
pub fn info_queries(transport: &MockTransport) -> usize {
    transport.requests_to(INFO_PATH).len()
}
