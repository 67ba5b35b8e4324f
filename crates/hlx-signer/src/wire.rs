//! Wire format types.
//!
//! Field names, field order, and string encoding of prices and sizes are
//! fixed by the exchange: the L1 signature is computed over the msgpack
//! serialization of exactly these structs, so any reordering or numeric
//! formatting drift invalidates the signature.
//!
//! IMPORTANT: `Option<T>` fields must use `skip_serializing_if` for msgpack
//! compatibility. The exchange omits missing keys, while serde would
//! otherwise emit `nil`.

use alloy::primitives::Address;
use hlx_core::{
    decimal_to_wire, CoreError, OrderKind, OrderRef, OrderRequest, Price, Size, TimeInForce,
    TriggerKind,
};
use serde::{Serialize, Serializer};

/// Lower-case `0x`-prefixed hex for an address.
///
/// Addresses inside hashed actions are always emitted in this form.
pub fn address_to_wire(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

pub(crate) fn serialize_address<S: Serializer>(
    address: &Address,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&address_to_wire(address))
}

/// Order wire format.
///
/// SDK example:
/// `{"a": 0, "b": true, "p": "105", "s": "0.2", "r": false, "t": {"limit": {"tif": "Ioc"}}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWire {
    /// Asset index
    #[serde(rename = "a")]
    pub asset: u32,

    /// Buy (true) or Sell (false)
    #[serde(rename = "b")]
    pub is_buy: bool,

    /// Limit price as string
    #[serde(rename = "p")]
    pub limit_px: String,

    /// Size as string
    #[serde(rename = "s")]
    pub sz: String,

    /// Reduce-only flag
    #[serde(rename = "r")]
    pub reduce_only: bool,

    /// Order type
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,

    /// Client order ID (optional)
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<String>,
}

impl OrderWire {
    /// Parse the wire price back into a decimal.
    pub fn price(&self) -> Result<Price, CoreError> {
        self.limit_px
            .parse()
            .map_err(|_| CoreError::InvalidPrice(self.limit_px.clone()))
    }

    /// Parse the wire size back into a decimal.
    pub fn size(&self) -> Result<Size, CoreError> {
        self.sz
            .parse()
            .map_err(|_| CoreError::InvalidSize(self.sz.clone()))
    }
}

/// Encode an order request for a resolved asset index.
///
/// The request is validated first; prices and sizes go through
/// [`decimal_to_wire`]. Encoding the same request twice yields identical
/// output.
pub fn order_to_wire(request: &OrderRequest, asset: u32) -> Result<OrderWire, CoreError> {
    request.validate()?;

    Ok(OrderWire {
        asset,
        is_buy: request.is_buy,
        limit_px: decimal_to_wire(request.limit_price.inner())?,
        sz: decimal_to_wire(request.size.inner())?,
        reduce_only: request.reduce_only,
        order_type: OrderTypeWire::from_kind(&request.order_type)?,
        cloid: request.cloid.map(|c| c.to_hex()),
    })
}

/// Order type wire format.
///
/// SDK examples:
/// - Limit IOC: {"limit": {"tif": "Ioc"}}
/// - Limit GTC: {"limit": {"tif": "Gtc"}}
/// - Limit ALO: {"limit": {"tif": "Alo"}}
/// - Trigger: {"trigger": {"isMarket": true, "triggerPx": "...", "tpsl": "tp"}}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OrderTypeWire {
    /// Limit order: {"limit": {"tif": "Gtc"|"Ioc"|"Alo"}}
    Limit { limit: LimitOrderType },
    /// Trigger order: {"trigger": {...}}
    Trigger { trigger: TriggerOrderType },
}

impl OrderTypeWire {
    pub fn from_kind(kind: &OrderKind) -> Result<Self, CoreError> {
        Ok(match *kind {
            OrderKind::Limit { tif } => Self::Limit {
                limit: LimitOrderType { tif },
            },
            OrderKind::Trigger {
                trigger_price,
                is_market,
                kind,
            } => Self::Trigger {
                trigger: TriggerOrderType {
                    is_market,
                    trigger_px: decimal_to_wire(trigger_price.inner())?,
                    tpsl: kind,
                },
            },
        })
    }
}

/// Limit order type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitOrderType {
    pub tif: TimeInForce,
}

/// Trigger order type.
///
/// Field order must match the SDK for correct msgpack serialization:
/// isMarket -> triggerPx -> tpsl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerOrderType {
    #[serde(rename = "isMarket")]
    pub is_market: bool,

    #[serde(rename = "triggerPx")]
    pub trigger_px: String,

    pub tpsl: TriggerKind,
}

/// Order grouping for an order batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grouping {
    /// Independent orders.
    #[default]
    Na,
    /// Parent order with linked TP/SL children.
    NormalTpsl,
    /// TP/SL attached to the position.
    PositionTpsl,
}

impl Grouping {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Na => "na",
            Self::NormalTpsl => "normalTpsl",
            Self::PositionTpsl => "positionTpsl",
        }
    }
}

impl Serialize for Grouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Builder fee attribution.
///
/// The address is always stored lower-cased: the exchange hash is computed
/// over the exact string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderInfo {
    #[serde(rename = "b")]
    pub address: String,
    /// Fee in tenths of a basis point.
    #[serde(rename = "f")]
    pub fee: u64,
}

impl BuilderInfo {
    pub fn new(address: impl AsRef<str>, fee: u64) -> Self {
        Self {
            address: address.as_ref().to_lowercase(),
            fee,
        }
    }

    /// Copy with the address lower-cased.
    pub fn normalized(&self) -> Self {
        Self::new(&self.address, self.fee)
    }
}

/// Cancel wire format.
///
/// SDK example: {"a": 5, "o": 123456789}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelWire {
    /// Asset index
    #[serde(rename = "a")]
    pub asset: u32,

    /// Exchange order ID
    #[serde(rename = "o")]
    pub oid: u64,
}

/// Cancel-by-cloid wire format.
///
/// Not the same shape as [`CancelWire`]: {"asset": 5, "cloid": "0x..."}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelByCloidWire {
    pub asset: u32,
    pub cloid: String,
}

/// Identifier of the order being modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OidWire {
    Oid(u64),
    Cloid(String),
}

impl From<OrderRef> for OidWire {
    fn from(target: OrderRef) -> Self {
        match target {
            OrderRef::Oid(oid) => Self::Oid(oid),
            OrderRef::Cloid(cloid) => Self::Cloid(cloid.to_hex()),
        }
    }
}

/// Modify wire format: {"oid": 123 | "0x...", "order": {...}}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifyWire {
    pub oid: OidWire,
    pub order: OrderWire,
}
