//! LLM Provider Strategy Pattern
//!
//! Defines the common contract every backend adapter implements. An adapter
//! takes a conversation and drives it to a final answer, running tool calls
//! in between when tools are enabled.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_core::provider::{CallOptions, ProviderAdapter};
//!
//! let options = CallOptions::new("sk-...", "gpt-4o-mini").with_tools(true);
//! let response = adapter.call(&mut conversation, &options, &tools).await?;
//! println!("{} ({} tokens)", response.content, response.tokens);
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatError, Result};
use crate::message::Conversation;
use crate::tool::ToolExecutor;

/// Round-trip cap for a call with tools enabled
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Content returned when the cap is reached without a final answer
pub const ITERATION_CAP_MESSAGE: &str =
    "I was unable to complete the request within the allowed number of tool iterations.";

/// Per-call options
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallOptions {
    /// Provider API key (may be empty for keyless backends)
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// Model identifier (e.g., "gpt-4o-mini", "claude-3-5-sonnet-latest", "llama3.2")
    pub model: String,

    /// Maximum tokens to generate per round-trip
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature in [0.0, 2.0]
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Offer tools to the model
    #[serde(default)]
    pub tools_enabled: bool,

    /// Endpoint base for backends without a fixed URL
    #[serde(default)]
    pub base_url: Option<String>,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    2048
}

impl CallOptions {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            tools_enabled: false,
            base_url: None,
        }
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_tools(mut self, enabled: bool) -> Self {
        self.tools_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Number of round-trips allowed for this call
    pub const fn max_iterations(&self) -> usize {
        if self.tools_enabled {
            MAX_TOOL_ITERATIONS
        } else {
            1
        }
    }

    /// Reject options no provider would accept.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(ChatError::Config("max_tokens must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::Config(format!(
                "temperature must be within [0.0, 2.0], got {}",
                self.temperature
            )));
        }
        Ok(())
    }

    /// `base_url` with surrounding whitespace and trailing slashes removed
    pub fn trimmed_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}

/// Unified adapter result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Final assistant text
    pub content: String,

    /// Tokens used across every round-trip of this call
    pub tokens: u32,

    /// Round-trips performed
    pub iterations: usize,

    /// The iteration cap was hit before the model produced a final answer
    pub truncated: bool,
}

impl ProviderResponse {
    pub fn finished(content: impl Into<String>, tokens: u32, iterations: usize) -> Self {
        Self {
            content: content.into(),
            tokens,
            iterations,
            truncated: false,
        }
    }

    pub fn cap_reached(tokens: u32, iterations: usize) -> Self {
        Self {
            content: ITERATION_CAP_MESSAGE.into(),
            tokens,
            iterations,
            truncated: true,
        }
    }
}

/// Strategy trait for LLM backends
///
/// Implementations are stateless: all per-call state lives on the stack of
/// `call`, so one adapter may serve many concurrent calls.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable lowercase identifier used for provider selection
    fn name(&self) -> &'static str;

    /// Whether `tools_enabled` has any effect on this backend
    fn supports_tools(&self) -> bool {
        true
    }

    /// Drive `conversation` to a final answer.
    ///
    /// New turns are appended to `conversation`; existing messages are
    /// never modified.
    async fn call(
        &self,
        conversation: &mut Conversation,
        options: &CallOptions,
        tools: &dyn ToolExecutor,
    ) -> Result<ProviderResponse>;
}

/// Fail if a provider response body carries an error.
///
/// The error may be an object with a `message` or a bare string; otherwise
/// `fallback` is used.
pub fn ensure_no_error(provider: &'static str, body: &Value, fallback: &str) -> Result<()> {
    let Some(error) = body.get("error").filter(|e| !e.is_null()) else {
        return Ok(());
    };
    let message = match error {
        Value::String(msg) if !msg.is_empty() => msg.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map_or_else(|| fallback.to_string(), str::to_string),
        _ => fallback.to_string(),
    };
    tracing::warn!(provider, %message, "Provider reported an error");
    Err(ChatError::provider_call(provider, message))
}

/// Read a token counter, treating missing or malformed values as zero.
pub fn token_count(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_option_defaults() {
        let opts = CallOptions::new("key", "llama3.2");
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.max_iterations(), 1);
        assert_eq!(opts.with_tools(true).max_iterations(), MAX_TOOL_ITERATIONS);
    }

    #[test]
    fn test_validate() {
        assert!(CallOptions::new("", "m").validate().is_ok());
        assert!(CallOptions::new("", "m").with_temperature(2.0).validate().is_ok());
        assert!(CallOptions::new("", "m").with_temperature(2.1).validate().is_err());
        assert!(CallOptions::new("", "m").with_temperature(f32::NAN).validate().is_err());
        assert!(CallOptions::new("", "m").with_max_tokens(0).validate().is_err());
    }

    #[test]
    fn test_trimmed_base_url() {
        let opts = CallOptions::new("", "m").with_base_url("http://host:8000/v1/ ");
        assert_eq!(opts.trimmed_base_url(), Some("http://host:8000/v1"));
        assert_eq!(CallOptions::new("", "m").with_base_url("  ").trimmed_base_url(), None);
    }

    #[test]
    fn test_ensure_no_error() {
        assert!(ensure_no_error("openai", &json!({"choices": []}), "x").is_ok());
        assert!(ensure_no_error("openai", &json!({"error": null}), "x").is_ok());

        let err = ensure_no_error("openai", &json!({"error": {"message": "bad key"}}), "x")
            .unwrap_err();
        assert_eq!(err.to_string(), "Provider call failed (openai): bad key");

        let err = ensure_no_error("ollama", &json!({"error": "model not found"}), "x").unwrap_err();
        assert!(err.to_string().ends_with("model not found"));

        let err = ensure_no_error(
            "anthropic",
            &json!({"error": {"type": "overloaded"}}),
            "Anthropic API error",
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("Anthropic API error"));
    }

    #[test]
    fn test_token_count() {
        assert_eq!(token_count(Some(&json!(42))), 42);
        assert_eq!(token_count(Some(&json!("42"))), 0);
        assert_eq!(token_count(None), 0);
    }
}
