//! Application configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `HLX_`-prefixed environment variables (`__` separates sections, e.g.
//! `HLX_EXCHANGE__BASE_URL`). The private key itself never lives in the
//! config; only where to read it from.

use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use config::{Config, Environment, File, FileFormat};
use hlx_exchange::ExchangeConfig;
use hlx_signer::KeySource;
use hlx_telemetry::LogFormat;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/hlx.toml";

/// Env var holding the key when no key source is configured.
///
/// Outside the `HLX_` prefix so the key never enters the layered config.
pub const DEFAULT_KEY_ENV: &str = "HYPERLIQUID_PRIVATE_KEY";

/// Where the signing key comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Environment variable containing the hex key.
    #[serde(default)]
    pub env_var: Option<String>,
    /// File containing the hex key (recommend 0600 permissions).
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Fail unless the key derives to this address.
    #[serde(default)]
    pub expected_address: Option<String>,
}

impl KeyConfig {
    /// A key file wins over an env var; with neither, [`DEFAULT_KEY_ENV`].
    pub fn source(&self) -> KeySource {
        match (&self.file, &self.env_var) {
            (Some(path), _) => KeySource::File { path: path.clone() },
            (None, Some(var_name)) => KeySource::EnvVar {
                var_name: var_name.clone(),
            },
            (None, None) => KeySource::EnvVar {
                var_name: DEFAULT_KEY_ENV.to_string(),
            },
        }
    }

    pub fn expected_address(&self) -> AppResult<Option<Address>> {
        self.expected_address
            .as_deref()
            .map(|s| {
                s.parse()
                    .map_err(|e| AppError::Config(format!("expected_address {s}: {e}")))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Overrides the `RUST_ENV` based choice.
    #[serde(default)]
    pub format: Option<LogFormat>,
    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub key: KeyConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load from `path` (missing file is fine) plus `HLX_*` env overrides.
    pub fn load(path: &Path) -> AppResult<Self> {
        let exists = path.exists();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("HLX").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        if !exists {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        }
        Ok(config)
    }

    /// Parse a TOML document (no env layering).
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.exchange.validate()?;
        self.key.expected_address()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlx_core::{Network, TESTNET_API_URL};
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_config_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.exchange.network(), Network::Mainnet);
        assert_eq!(config.exchange.default_slippage, dec!(0.05));
        assert!(matches!(
            config.key.source(),
            KeySource::EnvVar { ref var_name } if var_name == DEFAULT_KEY_ENV
        ));
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
            [exchange]
            base_url = "https://api.hyperliquid-testnet.xyz"
            vault_address = "0x1719884eb866cb12b2287399b15f7db5e7d775ea"
            default_slippage = "0.02"

            [key]
            file = "/run/secrets/hlx.key"

            [log]
            format = "json"
            filter = "warn"
            "#,
        )
        .unwrap();

        assert_eq!(config.exchange.base_url, TESTNET_API_URL);
        assert_eq!(config.exchange.default_slippage, dec!(0.02));
        assert!(config.exchange.vault().unwrap().is_some());
        assert!(matches!(config.key.source(), KeySource::File { .. }));
        assert_eq!(config.log.format, Some(LogFormat::Json));
    }

    #[test]
    fn test_bad_expected_address() {
        let result = AppConfig::from_toml(
            r#"
            [key]
            expected_address = "not-an-address"
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("hlx-config-does-not-exist.toml");
        let config = AppConfig::load(&path).unwrap();
        assert!(config.exchange.vault_address.is_none());
    }
}
