//! Recording transport for tests.
//!
//! Compiled for this crate's own tests and, behind the `test-util`
//! feature, for downstream test suites.

use std::collections::HashMap;

use hlx_core::BoxFuture;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::TransportError;
use crate::transport::{Transport, INFO_PATH};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

/// In-memory transport for tests.
///
/// Responses are keyed by path, or by `"/info:<type>"` for info queries so
/// that `meta` and `allMids` can answer differently. Unrouted requests fail
/// with a 404 status error.
#[derive(Debug)]
pub struct MockTransport {
    base_url: String,
    requests: Mutex<Vec<RecordedRequest>>,
    routes: Mutex<HashMap<String, Value>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new(hlx_core::TESTNET_API_URL)
    }
}

impl MockTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            requests: Mutex::new(Vec::new()),
            routes: Mutex::new(HashMap::new()),
        }
    }

    /// Answer every POST to `path` with `response`.
    pub fn respond(&self, path: &str, response: Value) {
        self.routes.lock().insert(path.to_string(), response);
    }

    /// Answer `/info` queries of the given `type` with `response`.
    pub fn respond_info(&self, query_type: &str, response: Value) {
        self.routes
            .lock()
            .insert(format!("{INFO_PATH}:{query_type}"), response);
    }

    /// All requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Requests sent to `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn route_key(path: &str, body: &Value) -> String {
        match body.get("type").and_then(Value::as_str) {
            Some(query_type) if path == INFO_PATH => format!("{path}:{query_type}"),
            _ => path.to_string(),
        }
    }
}

impl Transport for MockTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_json<'a>(
        &'a self,
        path: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            let key = Self::route_key(path, &body);
            self.requests.lock().push(RecordedRequest {
                path: path.to_string(),
                body,
            });

            self.routes
                .lock()
                .get(&key)
                .cloned()
                .ok_or_else(|| TransportError::Status {
                    status: 404,
                    body: format!("no mock route for {key}"),
                })
        })
    }
}
