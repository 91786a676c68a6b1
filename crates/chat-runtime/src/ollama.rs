//! Ollama LLM Provider
//!
//! Single-shot adapter for local Ollama inference via `/api/chat`.
//! Tool calling is not wired for this backend: `tools_enabled` is accepted
//! and ignored, and [`ProviderAdapter::supports_tools`] reports `false`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    message::{Conversation, Message},
    provider::{CallOptions, ProviderAdapter, ProviderResponse, ensure_no_error, token_count},
    tool::ToolExecutor,
    transport::Transport,
};
use serde::Serialize;
use serde_json::Value;

use crate::config::RuntimeConfig;

const CHAT_PATH: &str = "/api/chat";

/// Ollama provider
pub struct OllamaAdapter {
    transport: Arc<dyn Transport>,
    default_base_url: String,
    timeout: Duration,
}

impl OllamaAdapter {
    pub fn new(transport: Arc<dyn Transport>, config: &RuntimeConfig) -> Self {
        Self {
            transport,
            default_base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    /// Chat endpoint for a call, preferring the call's own base URL
    fn endpoint(&self, options: &CallOptions) -> String {
        let base = options
            .trimmed_base_url()
            .unwrap_or(self.default_base_url.as_str());
        format!("{base}{CHAT_PATH}")
    }

    /// Convert messages to Ollama's `{role, content}` pairs
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str(),
                content: m.content.to_text(),
            })
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for OllamaAdapter {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn supports_tools(&self) -> bool {
        false
    }

    async fn call(
        &self,
        conversation: &mut Conversation,
        options: &CallOptions,
        _tools: &dyn ToolExecutor,
    ) -> Result<ProviderResponse> {
        options.validate()?;

        let provider = self.name();
        let url = self.endpoint(options);
        let request = ChatRequest {
            model: &options.model,
            messages: Self::convert_messages(conversation.messages()),
            stream: false,
            options: OllamaOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
            },
        };
        let body = serde_json::to_value(&request)?;

        tracing::debug!(provider, %url, messages = request.messages.len(), "Sending chat request");
        let response = self
            .transport
            .post(&url, &body, &[], self.timeout)
            .await
            .map_err(|e| ChatError::provider_call(provider, e.to_string()))?;

        ensure_no_error(provider, &response, "Ollama API error")?;

        let content = response
            .pointer("/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tokens = token_count(response.get("eval_count"));

        Ok(ProviderResponse::finished(content, tokens, 1))
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}
