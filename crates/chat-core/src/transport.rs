//! Transport Contract
//!
//! One JSON-over-HTTP POST. Transports know nothing about providers; they
//! only move JSON and report network failures.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::Result;

/// Content type sent with every request
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Message returned in place of a body that was empty or not JSON
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON response";

/// JSON POST transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url`.
    ///
    /// `headers` are `"Name: Value"` lines. Network failures return
    /// `ChatError::Transport`; a reachable server with an unparseable body
    /// yields `{"error": "Invalid JSON response"}` instead of an error.
    async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: &[String],
        timeout: Duration,
    ) -> Result<Value>;
}

/// Split a `"Name: Value"` header line.
///
/// Returns `None` for lines without a colon or with an empty name.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Parse a response body, substituting the invalid-JSON marker.
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return invalid_json();
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Response body is not JSON");
        invalid_json()
    })
}

fn invalid_json() -> Value {
    json!({ "error": INVALID_JSON_MESSAGE })
}
