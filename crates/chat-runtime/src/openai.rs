//! OpenAI-compatible Adapters
//!
//! One orchestration loop shared by every backend that speaks the
//! chat-completions schema. Members differ only in their
//! [`EndpointResolver`]: where to POST and which headers to send.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    message::{Conversation, Message, MessageContent, Role},
    provider::{CallOptions, ProviderAdapter, ProviderResponse, ensure_no_error, token_count},
    tool::{OpenAiToolDefinition, ToolCall, ToolExecutor, run_tool_call},
    transport::Transport,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::RuntimeConfig;

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Where an OpenAI-compatible member sends its requests
pub trait EndpointResolver: Send + Sync {
    /// Stable lowercase provider name
    fn name(&self) -> &'static str;

    /// Human-readable name used in fallback error messages
    fn display_name(&self) -> &'static str;

    /// Resolve the chat-completions URL for a call
    fn endpoint(&self, options: &CallOptions) -> Result<String>;

    /// Request headers as `"Name: Value"` lines
    fn headers(&self, api_key: &str) -> Vec<String>;
}

/// api.openai.com
#[derive(Clone, Debug, Default)]
pub struct OpenAiEndpoint;

impl EndpointResolver for OpenAiEndpoint {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn endpoint(&self, _options: &CallOptions) -> Result<String> {
        Ok(OPENAI_URL.into())
    }

    fn headers(&self, api_key: &str) -> Vec<String> {
        vec![format!("Authorization: Bearer {api_key}")]
    }
}

/// openrouter.ai, with app attribution headers
#[derive(Clone, Debug)]
pub struct OpenRouterEndpoint {
    pub referer: String,
    pub title: String,
}

impl OpenRouterEndpoint {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            referer: config.openrouter_referer.clone(),
            title: config.openrouter_title.clone(),
        }
    }
}

impl EndpointResolver for OpenRouterEndpoint {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn display_name(&self) -> &'static str {
        "OpenRouter"
    }

    fn endpoint(&self, _options: &CallOptions) -> Result<String> {
        Ok(OPENROUTER_URL.into())
    }

    fn headers(&self, api_key: &str) -> Vec<String> {
        vec![
            format!("Authorization: Bearer {api_key}"),
            format!("HTTP-Referer: {}", self.referer),
            format!("X-Title: {}", self.title),
        ]
    }
}

/// Self-hosted OpenAI-compatible server; the base URL comes with each call
#[derive(Clone, Debug, Default)]
pub struct CustomEndpoint;

impl EndpointResolver for CustomEndpoint {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn display_name(&self) -> &'static str {
        "Custom"
    }

    fn endpoint(&self, options: &CallOptions) -> Result<String> {
        let base = options
            .trimmed_base_url()
            .ok_or_else(|| ChatError::Config("custom provider requires a base_url".into()))?;
        if base.ends_with(CHAT_COMPLETIONS_PATH) {
            Ok(base.to_string())
        } else {
            Ok(format!("{base}{CHAT_COMPLETIONS_PATH}"))
        }
    }

    fn headers(&self, api_key: &str) -> Vec<String> {
        if api_key.is_empty() {
            Vec::new()
        } else {
            vec![format!("Authorization: Bearer {api_key}")]
        }
    }
}

/// Shared chat-completions orchestration loop
pub struct OpenAiCompatible<E> {
    transport: Arc<dyn Transport>,
    endpoint: E,
    timeout: Duration,
}

pub type OpenAiAdapter = OpenAiCompatible<OpenAiEndpoint>;
pub type OpenRouterAdapter = OpenAiCompatible<OpenRouterEndpoint>;
pub type CustomAdapter = OpenAiCompatible<CustomEndpoint>;

impl<E: EndpointResolver> OpenAiCompatible<E> {
    pub fn new(transport: Arc<dyn Transport>, endpoint: E, config: &RuntimeConfig) -> Self {
        Self {
            transport,
            endpoint,
            timeout: config.timeout,
        }
    }

    pub const fn endpoint(&self) -> &E {
        &self.endpoint
    }
}

#[async_trait]
impl<E: EndpointResolver> ProviderAdapter for OpenAiCompatible<E> {
    fn name(&self) -> &'static str {
        self.endpoint.name()
    }

    async fn call(
        &self,
        conversation: &mut Conversation,
        options: &CallOptions,
        tools: &dyn ToolExecutor,
    ) -> Result<ProviderResponse> {
        options.validate()?;

        let provider = self.endpoint.name();
        let url = self.endpoint.endpoint(options)?;
        let headers = self.endpoint.headers(&options.api_key);
        let fallback = format!("{} API error", self.endpoint.display_name());
        let definitions = if options.tools_enabled {
            tools.tool_definitions()
        } else {
            Vec::new()
        };
        let max_iterations = options.max_iterations();
        let mut total_tokens: u32 = 0;

        for iteration in 1..=max_iterations {
            let request = ChatRequest {
                model: &options.model,
                messages: to_wire_messages(conversation.messages()),
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                tool_choice: (!definitions.is_empty()).then_some("auto"),
                tools: (!definitions.is_empty()).then_some(definitions.as_slice()),
            };
            let body = serde_json::to_value(&request)?;

            tracing::debug!(
                provider,
                iteration,
                messages = request.messages.len(),
                "Sending chat request"
            );
            let response = self
                .transport
                .post(&url, &body, &headers, self.timeout)
                .await
                .map_err(|e| ChatError::provider_call(provider, e.to_string()))?;

            ensure_no_error(provider, &response, &fallback)?;
            let parsed: ChatResponse = serde_json::from_value(response).map_err(|e| {
                ChatError::provider_call(provider, format!("Malformed response: {e}"))
            })?;

            total_tokens = total_tokens.saturating_add(
                token_count(parsed.usage.as_ref().and_then(|u| u.get("total_tokens"))),
            );

            let Some(choice) = parsed.choices.into_iter().next() else {
                return Ok(ProviderResponse::finished("", total_tokens, iteration));
            };
            let content = choice.message.content.unwrap_or_default();
            let requested = choice.message.tool_calls.unwrap_or_default();

            if !options.tools_enabled
                || choice.finish_reason.as_deref() != Some("tool_calls")
                || requested.is_empty()
            {
                return Ok(ProviderResponse::finished(content, total_tokens, iteration));
            }

            let calls: Vec<ToolCall> = requested
                .into_iter()
                .map(ResponseToolCall::into_call)
                .collect();
            tracing::debug!(provider, iteration, count = calls.len(), "Model requested tools");
            conversation.push(Message::assistant_tool_calls(content, calls.clone()));

            for call in &calls {
                let result = run_tool_call(tools, call).await;
                conversation.push(Message::tool(result.tool_call_id, result.content));
            }
        }

        tracing::warn!(provider, max_iterations, "Tool iteration cap reached");
        Ok(ProviderResponse::cap_reached(total_tokens, max_iterations))
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [OpenAiToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, PartialEq, Serialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        let arguments = if call.arguments.is_null() {
            "{}".to_string()
        } else {
            call.arguments.to_string()
        };
        Self {
            id: call.id.clone(),
            kind: "function",
            function: WireFunction {
                name: call.name.clone(),
                arguments,
            },
        }
    }
}

/// Convert the conversation to chat-completions messages.
///
/// Block-shaped turns (as produced by the Anthropic adapter) are
/// re-expressed: `tool_use` blocks become `tool_calls`, `tool_result`
/// blocks become `tool` messages.
pub(crate) fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    let mut wire = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            Role::Assistant => {
                let mut calls: Vec<WireToolCall> =
                    message.tool_calls.iter().map(WireToolCall::from).collect();
                calls.extend(
                    message
                        .content
                        .blocks()
                        .iter()
                        .filter_map(|b| b.as_tool_call())
                        .map(|c| WireToolCall::from(&c)),
                );
                let text = message.content.to_text();
                wire.push(WireMessage {
                    role: "assistant",
                    content: if text.is_empty() && !calls.is_empty() {
                        None
                    } else {
                        Some(text)
                    },
                    tool_calls: calls,
                    tool_call_id: None,
                });
            }
            Role::Tool => wire.push(WireMessage {
                tool_call_id: message.tool_call_id.clone(),
                ..WireMessage::text("tool", message.content.to_text())
            }),
            Role::User => {
                if let MessageContent::Blocks(blocks) = &message.content {
                    for block in blocks.iter().filter(|b| b.kind == "tool_result") {
                        wire.push(WireMessage {
                            tool_call_id: block.tool_use_id.clone(),
                            ..WireMessage::text("tool", block_result_text(block.content.as_ref()))
                        });
                    }
                    let text = message.content.to_text();
                    if !text.is_empty() {
                        wire.push(WireMessage::text("user", text));
                    }
                } else {
                    wire.push(WireMessage::text("user", message.content.to_text()));
                }
            }
            Role::System => wire.push(WireMessage::text("system", message.content.to_text())),
        }
    }
    wire
}

fn block_result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    message: ResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    /// A JSON-encoded string per the schema; some servers send an object
    #[serde(default)]
    arguments: Option<Value>,
}

impl ResponseToolCall {
    fn into_call(self) -> ToolCall {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        ToolCall {
            id,
            name: self.function.name,
            arguments: parse_arguments(self.function.arguments),
        }
    }
}

/// Decode tool arguments; anything that is not a JSON object becomes `{}`.
fn parse_arguments(raw: Option<Value>) -> Value {
    let parsed = match raw {
        Some(Value::String(s)) => serde_json::from_str::<Value>(&s).ok(),
        other => other,
    };
    match parsed {
        Some(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}
