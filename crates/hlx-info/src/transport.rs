//! Transport to the exchange REST API.
//!
//! Every call in this workspace is a JSON POST to either `/info` or
//! `/exchange` under one base URL. The [`Transport`] trait is that single
//! primitive; [`HttpTransport`] implements it over reqwest.

use std::time::Duration;

use hlx_core::BoxFuture;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the read-only query endpoint.
pub const INFO_PATH: &str = "/info";

/// Path of the signed action endpoint.
pub const EXCHANGE_PATH: &str = "/exchange";

/// JSON POST capability against one API base URL.
pub trait Transport: Send + Sync {
    /// Base URL all paths are resolved against.
    fn base_url(&self) -> &str;

    /// POST `body` to `path` and return the decoded JSON response.
    fn post_json<'a>(&'a self, path: &'a str, body: Value)
        -> BoxFuture<'a, Result<Value, TransportError>>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `https://api.hyperliquid.xyz`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_json<'a>(
        &'a self,
        path: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, path);
            debug!(%url, "POST");

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| TransportError::Http(format!("HTTP request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_trims_base_url() {
        let transport = HttpTransport::new("https://api.hyperliquid.xyz/").unwrap();
        assert_eq!(transport.base_url(), "https://api.hyperliquid.xyz");
    }
}
