//! Command-line front end for the hlx exchange client.
//!
//! Wires layered configuration, key loading, the HTTP transport and the
//! exchange dispatcher together behind a small set of subcommands.

pub mod cli;
pub mod config;
pub mod error;

pub use cli::{Cli, Command, Side, Tif};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
