//! Dispatcher configuration.

use alloy::primitives::Address;
use hlx_core::{Network, MAINNET_API_URL};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, ExchangeResult};

/// Identity and defaults for an [`crate::Exchange`].
///
/// Addresses are kept as strings here so the struct deserializes from any
/// config source; [`ExchangeConfig::vault`] and [`ExchangeConfig::account`]
/// parse them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API base URL. Selects the signing network.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Vault or sub-account the wallet trades for.
    #[serde(default)]
    pub vault_address: Option<String>,
    /// Account the wallet acts as an agent for.
    #[serde(default)]
    pub account_address: Option<String>,
    /// L1 actions are rejected by the exchange after this timestamp (ms).
    #[serde(default)]
    pub expires_after: Option<u64>,
    /// Market order slippage as a fraction (0.05 = 5%).
    #[serde(default = "default_slippage")]
    pub default_slippage: Decimal,
}

fn default_base_url() -> String {
    MAINNET_API_URL.to_string()
}

fn default_slippage() -> Decimal {
    Decimal::new(5, 2)
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vault_address: None,
            account_address: None,
            expires_after: None,
            default_slippage: default_slippage(),
        }
    }
}

fn parse_address(field: &str, raw: &Option<String>) -> ExchangeResult<Option<Address>> {
    raw.as_deref()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| ExchangeError::Config(format!("{field} {s}: {e}")))
        })
        .transpose()
}

impl ExchangeConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            base_url: network.base_url().to_string(),
            ..Self::default()
        }
    }

    pub fn network(&self) -> Network {
        Network::from_base_url(&self.base_url)
    }

    pub fn vault(&self) -> ExchangeResult<Option<Address>> {
        parse_address("vault_address", &self.vault_address)
    }

    pub fn account(&self) -> ExchangeResult<Option<Address>> {
        parse_address("account_address", &self.account_address)
    }

    pub fn validate(&self) -> ExchangeResult<()> {
        self.vault()?;
        self.account()?;
        if self.default_slippage.is_sign_negative() || self.default_slippage >= Decimal::ONE {
            return Err(ExchangeError::Config(format!(
                "default_slippage {} must be in [0, 1)",
                self.default_slippage
            )));
        }
        Ok(())
    }
}
