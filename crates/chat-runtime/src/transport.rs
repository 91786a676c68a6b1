//! HTTP Transport
//!
//! `reqwest`-backed implementation of the `Transport` contract.

use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    transport::{CONTENT_TYPE_JSON, Transport, parse_body, parse_header_line},
};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

/// JSON POST transport over a shared `reqwest::Client`
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS roots, ...)
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Convert `"Name: Value"` lines into a header map.
///
/// `Content-Type: application/json` is always present. Lines that do not
/// form a valid header are dropped with a warning.
pub fn header_map(headers: &[String]) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));

    for line in headers {
        let Some((name, value)) = parse_header_line(line) else {
            tracing::warn!("Skipping malformed header line");
            continue;
        };
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Skipping invalid header"),
        }
    }

    map
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        headers: &[String],
        timeout: Duration,
    ) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .headers(header_map(headers))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        tracing::debug!(%url, %status, bytes = bytes.len(), "Provider responded");
        Ok(parse_body(&bytes))
    }
}
