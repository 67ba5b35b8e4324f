//! Command-line arguments and command execution.

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand, ValueEnum};
use hlx_core::{Cloid, OrderRequest, Price, Size, TimeInForce};
use hlx_exchange::{Exchange, MarketOptions};
use hlx_info::MarketInfo;
use hlx_signer::address_to_wire;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::error::AppResult;

/// Hyperliquid exchange client.
#[derive(Parser, Debug)]
#[command(name = "hlx", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (can also be set via HLX_CONFIG env var)
    #[arg(short, long, env = "HLX_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Use the testnet API regardless of the configured base URL
    #[arg(long)]
    pub testnet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tif {
    Gtc,
    Ioc,
    Alo,
}

impl From<Tif> for TimeInForce {
    fn from(tif: Tif) -> Self {
        match tif {
            Tif::Gtc => Self::GoodTilCancelled,
            Tif::Ioc => Self::ImmediateOrCancel,
            Tif::Alo => Self::AddLiquidityOnly,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Place a limit order
    Order {
        coin: String,
        #[arg(value_enum)]
        side: Side,
        size: Decimal,
        price: Decimal,
        #[arg(long, value_enum, default_value_t = Tif::Gtc)]
        tif: Tif,
        #[arg(long)]
        reduce_only: bool,
        /// Client order id (0x + 32 hex digits)
        #[arg(long)]
        cloid: Option<String>,
    },
    /// Open a position with an aggressive IOC limit order
    MarketOpen {
        coin: String,
        #[arg(value_enum)]
        side: Side,
        size: Decimal,
        /// Slippage fraction (default from config)
        #[arg(long)]
        slippage: Option<Decimal>,
        /// Reference price instead of the current mid
        #[arg(long)]
        price: Option<Decimal>,
    },
    /// Close a position with a reduce-only IOC limit order
    MarketClose {
        coin: String,
        /// Partial size (default: whole position)
        #[arg(long)]
        size: Option<Decimal>,
        #[arg(long)]
        slippage: Option<Decimal>,
    },
    /// Cancel by exchange order id
    Cancel { coin: String, oid: u64 },
    /// Cancel by client order id
    CancelCloid { coin: String, cloid: String },
    /// Schedule a cancel-all at TIME (ms); omit TIME to clear
    ScheduleCancel { time: Option<u64> },
    /// Set leverage for a coin
    Leverage {
        coin: String,
        leverage: u32,
        /// Isolated margin instead of cross
        #[arg(long)]
        isolated: bool,
    },
    /// Send USDC to another address
    UsdSend { destination: Address, amount: Decimal },
    /// Withdraw USDC through the bridge
    Withdraw { destination: Address, amount: Decimal },
    /// Approve a freshly generated agent key
    ApproveAgent {
        #[arg(long)]
        name: Option<String>,
    },
    /// Show open positions
    Positions {
        /// User address (default: vault, account, or wallet)
        #[arg(long)]
        user: Option<Address>,
    },
}

impl Command {
    /// Run against a dispatcher and return the JSON to print.
    pub async fn run(self, exchange: &Exchange, info: Arc<dyn MarketInfo>) -> AppResult<Value> {
        let response = match self {
            Self::Order {
                coin,
                side,
                size,
                price,
                tif,
                reduce_only,
                cloid,
            } => {
                let mut request = OrderRequest::limit(
                    coin,
                    side.is_buy(),
                    Size::new(size),
                    Price::new(price),
                    tif.into(),
                );
                if reduce_only {
                    request = request.reduce_only();
                }
                if let Some(cloid) = cloid {
                    request = request.with_cloid(Cloid::parse(&cloid)?);
                }
                exchange.order(request, None).await?
            }
            Self::MarketOpen {
                coin,
                side,
                size,
                slippage,
                price,
            } => {
                let options = MarketOptions {
                    price: price.map(Price::new),
                    slippage,
                    ..MarketOptions::default()
                };
                exchange
                    .market_open(&coin, side.is_buy(), Size::new(size), options)
                    .await?
            }
            Self::MarketClose {
                coin,
                size,
                slippage,
            } => {
                let options = MarketOptions {
                    slippage,
                    ..MarketOptions::default()
                };
                exchange
                    .market_close(&coin, size.map(Size::new), options)
                    .await?
            }
            Self::Cancel { coin, oid } => exchange.cancel(&coin, oid).await?,
            Self::CancelCloid { coin, cloid } => {
                exchange.cancel_by_cloid(&coin, Cloid::parse(&cloid)?).await?
            }
            Self::ScheduleCancel { time } => exchange.schedule_cancel(time).await?,
            Self::Leverage {
                coin,
                leverage,
                isolated,
            } => exchange.update_leverage(leverage, &coin, !isolated).await?,
            Self::UsdSend {
                destination,
                amount,
            } => exchange.usd_transfer(amount, destination).await?,
            Self::Withdraw {
                destination,
                amount,
            } => exchange.withdraw_from_bridge(amount, destination).await?,
            Self::ApproveAgent { name } => {
                let (response, agent_key) = exchange.approve_agent(name).await?;
                let agent_address = agent_key.address()?;
                // Printed once for the operator; never logged.
                let secret = agent_key.into_hex();
                json!({
                    "response": response,
                    "agentAddress": address_to_wire(&agent_address),
                    "agentPrivateKey": secret.as_str(),
                })
            }
            Self::Positions { user } => {
                let user = user.unwrap_or_else(|| exchange.effective_user());
                let positions = info.user_positions(&address_to_wire(&user)).await?;
                serde_json::to_value(positions)?
            }
        };
        Ok(response)
    }
}
