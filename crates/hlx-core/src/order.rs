//! Order request types and client order identifiers.
//!
//! These are the caller-facing, symbolic forms: coins are names, prices and
//! sizes are decimals. The wire codec in `hlx-signer` turns them into the
//! exchange layout once an asset index is known.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::{Price, Size};
use crate::error::{CoreError, Result};

/// Time-in-force for limit orders.
///
/// Serialized as its wire string (`Gtc`, `Ioc`, `Alo`) by every format,
/// msgpack included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    #[serde(rename = "Gtc")]
    GoodTilCancelled,
    /// Immediate-or-cancel. Market orders are aggressive IOC limits.
    #[serde(rename = "Ioc")]
    ImmediateOrCancel,
    /// Add-liquidity-only (post only).
    #[serde(rename = "Alo")]
    AddLiquidityOnly,
}

impl TimeInForce {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::GoodTilCancelled => "Gtc",
            Self::ImmediateOrCancel => "Ioc",
            Self::AddLiquidityOnly => "Alo",
        }
    }
}

impl Serialize for TimeInForce {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Take-profit or stop-loss trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum TriggerKind {
    #[serde(rename = "tp")]
    TakeProfit,
    #[serde(rename = "sl")]
    StopLoss,
}

impl TriggerKind {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::TakeProfit => "tp",
            Self::StopLoss => "sl",
        }
    }
}

impl Serialize for TriggerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Order type: exactly one of limit or trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Limit {
        tif: TimeInForce,
    },
    Trigger {
        trigger_price: Price,
        is_market: bool,
        kind: TriggerKind,
    },
}

/// Client order ID: a caller-chosen 128-bit identifier.
///
/// The raw form is always exactly 16 bytes. The textual form is `0x`
/// followed by 32 hex digits and is what appears on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cloid([u8; 16]);

impl Cloid {
    /// Generate a fresh random cloid (UUID v4 bytes).
    pub fn random() -> Self {
        Self::from_raw(*Uuid::new_v4().as_bytes())
    }

    pub fn from_raw(raw: [u8; 16]) -> Self {
        Self(raw)
    }

    /// Parse the `0x` + 32 hex digit form.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidCloidFormat` if the prefix is missing, the
    /// length is wrong, or any digit is not hex.
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidCloidFormat(s.to_string()))?;
        if digits.len() != 32 {
            return Err(CoreError::InvalidCloidFormat(s.to_string()));
        }
        let mut raw = [0u8; 16];
        hex::decode_to_slice(digits, &mut raw)
            .map_err(|_| CoreError::InvalidCloidFormat(s.to_string()))?;
        Ok(Self(raw))
    }

    /// The 16 raw bytes.
    pub fn to_raw(&self) -> [u8; 16] {
        self.0
    }

    /// Lower-case `0x`-prefixed hex, as sent to the exchange.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Cloid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Cloid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Cloid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cloid({})", self.to_hex())
    }
}

impl Serialize for Cloid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Cloid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A single order as the caller describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    pub size: Size,
    pub limit_price: Price,
    pub order_type: OrderKind,
    pub reduce_only: bool,
    pub cloid: Option<Cloid>,
}

impl OrderRequest {
    /// Plain limit order with no cloid.
    pub fn limit(
        coin: impl Into<String>,
        is_buy: bool,
        size: Size,
        limit_price: Price,
        tif: TimeInForce,
    ) -> Self {
        Self {
            coin: coin.into(),
            is_buy,
            size,
            limit_price,
            order_type: OrderKind::Limit { tif },
            reduce_only: false,
            cloid: None,
        }
    }

    pub fn with_cloid(mut self, cloid: Cloid) -> Self {
        self.cloid = Some(cloid);
        self
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    /// Reject non-positive sizes and prices before any encoding.
    pub fn validate(&self) -> Result<()> {
        if !self.size.is_positive() {
            return Err(CoreError::InvalidSize(format!(
                "{} for {} (must be positive)",
                self.size, self.coin
            )));
        }
        if !self.limit_price.is_positive() {
            return Err(CoreError::InvalidPrice(format!(
                "{} for {} (must be positive)",
                self.limit_price, self.coin
            )));
        }
        if let OrderKind::Trigger { trigger_price, .. } = self.order_type {
            if !trigger_price.is_positive() {
                return Err(CoreError::InvalidPrice(format!(
                    "trigger {trigger_price} for {} (must be positive)",
                    self.coin
                )));
            }
        }
        Ok(())
    }
}

/// Reference to a resting order: exchange id or client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRef {
    Oid(u64),
    Cloid(Cloid),
}

impl From<u64> for OrderRef {
    fn from(oid: u64) -> Self {
        Self::Oid(oid)
    }
}

impl From<Cloid> for OrderRef {
    fn from(cloid: Cloid) -> Self {
        Self::Cloid(cloid)
    }
}

/// Replace a resting order with a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    pub target: OrderRef,
    pub order: OrderRequest,
}

/// Cancel by exchange order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub coin: String,
    pub oid: u64,
}

/// Cancel by client order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelByCloidRequest {
    pub coin: String,
    pub cloid: Cloid,
}
