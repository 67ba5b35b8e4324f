//! Structured logging for hlx.
//!
//! One entry point, [`init_logging`], installs a `tracing` subscriber:
//! JSON lines in production (`RUST_ENV=production`), pretty output otherwise.
//! `RUST_LOG` overrides the default filter.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, init_logging_with, LogFormat, DEFAULT_FILTER};
