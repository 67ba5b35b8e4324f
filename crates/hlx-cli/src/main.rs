//! hlx - Hyperliquid exchange client entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hlx_cli::{AppConfig, Cli};
use hlx_core::Network;
use hlx_exchange::Exchange;
use hlx_info::{HttpTransport, InfoClient, MarketInfo, Transport};
use hlx_telemetry::LogFormat;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if cli.testnet {
        config.exchange.base_url = Network::Testnet.base_url().to_string();
    }

    hlx_telemetry::init_logging_with(
        config.log.format.unwrap_or_else(LogFormat::from_env),
        config.log.filter.as_deref(),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.exchange.base_url,
        "Starting hlx"
    );

    let wallet = config
        .key
        .source()
        .load(config.key.expected_address()?)
        .context("loading signing key")?;

    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.exchange.base_url)?);
    let info: Arc<dyn MarketInfo> = Arc::new(
        InfoClient::connect(Arc::clone(&transport))
            .await
            .context("loading asset metadata")?,
    );
    let exchange = Exchange::new(
        Arc::new(wallet),
        Arc::clone(&transport),
        Arc::clone(&info),
        &config.exchange,
    )?;

    let output = cli.command.run(&exchange, info).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
