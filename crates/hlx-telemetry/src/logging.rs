//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,hlx=debug";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human readable.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// JSON when `RUST_ENV` is `production`, pretty otherwise.
    pub fn from_env() -> Self {
        Self::from_rust_env(std::env::var("RUST_ENV").ok().as_deref())
    }

    fn from_rust_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Initialize logging with the format picked from `RUST_ENV`.
pub fn init_logging() -> TelemetryResult<()> {
    init_logging_with(LogFormat::from_env(), None)
}

/// Initialize logging with an explicit format and optional fallback filter.
///
/// `RUST_LOG` still wins over `filter`; [`DEFAULT_FILTER`] applies when
/// neither is set. Output goes to stderr. Fails if a global subscriber is already installed.
pub fn init_logging_with(format: LogFormat, filter: Option<&str>) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => build_filter(filter.unwrap_or(DEFAULT_FILTER))?,
    };

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn build_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_rust_env() {
        assert_eq!(LogFormat::from_rust_env(Some("production")), LogFormat::Json);
        assert_eq!(LogFormat::from_rust_env(Some("staging")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_rust_env(None), LogFormat::Pretty);
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(build_filter(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let err = build_filter("info,hlx=notalevel").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever call wins, a second install must error instead of panic.
        let _ = init_logging_with(LogFormat::Pretty, Some("warn"));
        assert!(init_logging_with(LogFormat::Json, Some("warn")).is_err());
    }
}
