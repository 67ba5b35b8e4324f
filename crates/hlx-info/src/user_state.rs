//! Per-user account state responses.
//!
//! Raw REST shapes for `clearinghouseState` (perp positions) and
//! `spotClearinghouseState` (spot balances), plus conversion into the
//! `hlx-core` domain types. Numbers arrive as strings and are parsed into
//! `Decimal` without going through floats.

use hlx_core::{Position, Price, SpotBalance};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{InfoError, InfoResult};

fn parse_decimal(field: &str, raw: &str) -> InfoResult<Decimal> {
    raw.parse()
        .map_err(|e| InfoError::ParseError(format!("{field}={raw}: {e}")))
}

/// Margin summary from user state.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarginSummary {
    /// Account value in USD.
    #[serde(rename = "accountValue")]
    pub account_value: String,
    /// Total notional position value.
    #[serde(rename = "totalNtlPos")]
    pub total_notional_position: String,
    /// Total raw USD.
    #[serde(rename = "totalRawUsd")]
    pub total_raw_usd: String,
    /// Total margin used.
    #[serde(rename = "totalMarginUsed")]
    pub total_margin_used: String,
}

/// clearinghouseState response.
///
/// Endpoint: POST /info with `{"type": "clearinghouseState", "user": "<address>"}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClearinghouseStateResponse {
    #[serde(rename = "marginSummary")]
    pub margin_summary: Option<MarginSummary>,
    #[serde(rename = "crossMarginSummary")]
    pub cross_margin_summary: Option<MarginSummary>,
    /// Withdrawable balance.
    pub withdrawable: Option<String>,
    /// Open positions.
    #[serde(rename = "assetPositions", default)]
    pub asset_positions: Vec<AssetPositionEntry>,
    /// Timestamp in milliseconds.
    pub time: Option<u64>,
}

impl ClearinghouseStateResponse {
    /// Non-empty positions as domain values.
    pub fn positions(&self) -> InfoResult<Vec<Position>> {
        let mut positions = Vec::with_capacity(self.asset_positions.len());
        for entry in &self.asset_positions {
            let position = entry.position.to_position()?;
            if !position.is_empty() {
                positions.push(position);
            }
        }
        Ok(positions)
    }
}

/// Asset position entry from clearinghouseState.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetPositionEntry {
    pub position: AssetPositionData,
    /// Position type ("oneWay").
    #[serde(rename = "type")]
    pub position_type: Option<String>,
}

/// Position data within AssetPositionEntry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetPositionData {
    pub coin: String,
    /// Signed size: positive = long, negative = short.
    pub szi: String,
    #[serde(rename = "entryPx")]
    pub entry_px: Option<String>,
    #[serde(rename = "liquidationPx")]
    pub liquidation_px: Option<String>,
    #[serde(rename = "unrealizedPnl")]
    pub unrealized_pnl: Option<String>,
    pub leverage: Option<LeverageInfo>,
}

/// Leverage information.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeverageInfo {
    /// "cross" or "isolated".
    #[serde(rename = "type")]
    pub leverage_type: Option<String>,
    pub value: Option<u32>,
}

impl AssetPositionData {
    pub fn size_decimal(&self) -> InfoResult<Decimal> {
        parse_decimal("szi", &self.szi)
    }

    pub fn to_position(&self) -> InfoResult<Position> {
        let entry_price = self
            .entry_px
            .as_deref()
            .map(|px| parse_decimal("entryPx", px).map(Price::new))
            .transpose()?;

        Ok(Position {
            coin: self.coin.clone(),
            size: self.size_decimal()?,
            entry_price,
        })
    }
}

/// spotClearinghouseState response.
///
/// Endpoint: POST /info with `{"type": "spotClearinghouseState", "user": "<address>"}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotClearinghouseStateResponse {
    #[serde(default)]
    pub balances: Vec<RawSpotBalance>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSpotBalance {
    pub coin: String,
    /// Token index.
    pub token: Option<u32>,
    pub total: String,
    pub hold: String,
    #[serde(rename = "entryNtl")]
    pub entry_notional: Option<String>,
}

impl RawSpotBalance {
    pub fn to_balance(&self) -> InfoResult<SpotBalance> {
        Ok(SpotBalance {
            coin: self.coin.clone(),
            total: parse_decimal("total", &self.total)?,
            hold: parse_decimal("hold", &self.hold)?,
        })
    }
}

impl SpotClearinghouseStateResponse {
    pub fn balances(&self) -> InfoResult<Vec<SpotBalance>> {
        self.balances.iter().map(RawSpotBalance::to_balance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_margin_summary_parsing() {
        let state: ClearinghouseStateResponse = serde_json::from_str(
            r#"{
                "marginSummary": {
                    "accountValue": "10000.50",
                    "totalNtlPos": "5000.00",
                    "totalRawUsd": "10000.50",
                    "totalMarginUsed": "1000.00"
                },
                "withdrawable": "9000.50"
            }"#,
        )
        .unwrap();

        let summary = state.margin_summary.unwrap();
        assert_eq!(summary.account_value, "10000.50");
        assert_eq!(summary.total_notional_position, "5000.00");
        assert!(state.cross_margin_summary.is_none());
        assert!(state.asset_positions.is_empty());
    }

    #[test]
    fn test_clearinghouse_positions_skip_empty() {
        let raw = r#"{
            "marginSummary": {"accountValue": "1000.0", "totalNtlPos": "0.0", "totalRawUsd": "1000.0", "totalMarginUsed": "0.0"},
            "withdrawable": "1000.0",
            "assetPositions": [
                {"type": "oneWay", "position": {"coin": "ETH", "szi": "-0.5", "entryPx": "2500.1", "leverage": {"type": "cross", "value": 10}}},
                {"type": "oneWay", "position": {"coin": "BTC", "szi": "0.0", "entryPx": null}}
            ],
            "time": 1700000000000
        }"#;
        let state: ClearinghouseStateResponse = serde_json::from_str(raw).unwrap();
        let positions = state.positions().unwrap();

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].coin, "ETH");
        assert_eq!(positions[0].size, dec!(-0.5));
        assert!(positions[0].is_short());
        assert_eq!(positions[0].entry_price, Some(Price::new(dec!(2500.1))));
    }

    #[test]
    fn test_bad_size_is_parse_error() {
        let data = AssetPositionData {
            coin: "ETH".to_string(),
            szi: "not-a-number".to_string(),
            entry_px: None,
            liquidation_px: None,
            unrealized_pnl: None,
            leverage: None,
        };
        assert!(matches!(data.to_position(), Err(InfoError::ParseError(_))));
    }

    #[test]
    fn test_spot_balances() {
        let raw = r#"{"balances": [
            {"coin": "USDC", "token": 0, "total": "150.25", "hold": "50.0", "entryNtl": "0.0"},
            {"coin": "PURR", "token": 1, "total": "1000", "hold": "0"}
        ]}"#;
        let state: SpotClearinghouseStateResponse = serde_json::from_str(raw).unwrap();
        let balances = state.balances().unwrap();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].available(), dec!(100.25));
        assert_eq!(balances[1].coin, "PURR");
    }
}
