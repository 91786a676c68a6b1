//! Anthropic Messages API Adapter
//!
//! Same contract and iteration cap as the OpenAI-compatible loop, but a
//! different conversation shape: the system prompt travels in its own
//! field, tool calls arrive as `tool_use` content blocks, and all results
//! for one assistant turn go back in a single user message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    error::{ChatError, Result},
    message::{ContentBlock, Conversation, Message, MessageContent, Role},
    provider::{CallOptions, ProviderAdapter, ProviderResponse, ensure_no_error, token_count},
    tool::{AnthropicToolDefinition, ToolCall, ToolExecutor, run_tool_call},
    transport::Transport,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::RuntimeConfig;

pub const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API adapter
pub struct AnthropicAdapter {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl AnthropicAdapter {
    pub fn new(transport: Arc<dyn Transport>, config: &RuntimeConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout,
        }
    }

    fn headers(api_key: &str) -> Vec<String> {
        vec![
            format!("x-api-key: {api_key}"),
            format!("anthropic-version: {ANTHROPIC_VERSION}"),
        ]
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn call(
        &self,
        conversation: &mut Conversation,
        options: &CallOptions,
        tools: &dyn ToolExecutor,
    ) -> Result<ProviderResponse> {
        options.validate()?;

        let provider = self.name();
        let headers = Self::headers(&options.api_key);
        let definitions = if options.tools_enabled {
            tools.anthropic_tool_definitions()
        } else {
            Vec::new()
        };
        let max_iterations = options.max_iterations();
        let mut total_tokens: u32 = 0;

        for iteration in 1..=max_iterations {
            let (system, messages) = split_system(conversation.messages());
            let request = MessagesRequest {
                model: &options.model,
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                system,
                messages,
                tools: (!definitions.is_empty()).then_some(definitions.as_slice()),
            };
            let body = serde_json::to_value(&request)?;

            tracing::debug!(
                provider,
                iteration,
                messages = request.messages.len(),
                "Sending messages request"
            );
            let response = self
                .transport
                .post(ANTHROPIC_URL, &body, &headers, self.timeout)
                .await
                .map_err(|e| ChatError::provider_call(provider, e.to_string()))?;

            ensure_no_error(provider, &response, "Anthropic API error")?;
            let parsed: MessagesResponse = serde_json::from_value(response).map_err(|e| {
                ChatError::provider_call(provider, format!("Malformed response: {e}"))
            })?;

            if let Some(usage) = &parsed.usage {
                total_tokens = total_tokens
                    .saturating_add(token_count(usage.get("input_tokens")))
                    .saturating_add(token_count(usage.get("output_tokens")));
            }

            let blocks = parsed.content.unwrap_or_default();
            let calls: Vec<ToolCall> = blocks
                .iter()
                .filter_map(ContentBlock::as_tool_call)
                .collect();

            if !options.tools_enabled
                || parsed.stop_reason.as_deref() != Some("tool_use")
                || calls.is_empty()
            {
                let text = MessageContent::Blocks(blocks).to_text();
                return Ok(ProviderResponse::finished(text, total_tokens, iteration));
            }

            tracing::debug!(provider, iteration, count = calls.len(), "Model requested tools");
            conversation.push(Message::assistant(blocks));

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = run_tool_call(tools, call).await;
                results.push(ContentBlock::tool_result(result.tool_call_id, result.content));
            }
            conversation.push(Message::user(results));
        }

        tracing::warn!(provider, max_iterations, "Tool iteration cap reached");
        Ok(ProviderResponse::cap_reached(total_tokens, max_iterations))
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [AnthropicToolDefinition]>,
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct WireMessage {
    role: &'static str,
    content: MessageContent,
}

/// Separate system prompts from the turns sent as `messages`.
///
/// Multiple system messages are joined with a blank line. OpenAI-shaped
/// history (assistant `tool_calls`, `tool` messages) is converted to
/// `tool_use`/`tool_result` blocks; consecutive tool messages share one
/// user turn.
pub(crate) fn split_system(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
    let mut system: Vec<String> = Vec::new();
    let mut wire: Vec<WireMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => system.push(message.content.to_text()),
            Role::User => wire.push(WireMessage {
                role: "user",
                content: message.content.clone(),
            }),
            Role::Assistant if message.has_tool_calls() => {
                let mut blocks = match &message.content {
                    MessageContent::Blocks(blocks) => blocks.clone(),
                    MessageContent::Text(text) if text.is_empty() => Vec::new(),
                    MessageContent::Text(text) => vec![ContentBlock::text(text.clone())],
                };
                blocks.extend(message.tool_calls.iter().map(|c| {
                    ContentBlock::tool_use(c.id.clone(), c.name.clone(), c.arguments.clone())
                }));
                wire.push(WireMessage {
                    role: "assistant",
                    content: MessageContent::Blocks(blocks),
                });
            }
            Role::Assistant => wire.push(WireMessage {
                role: "assistant",
                content: message.content.clone(),
            }),
            Role::Tool => {
                let block = ContentBlock::tool_result(
                    message.tool_call_id.clone().unwrap_or_default(),
                    message.content.to_text(),
                );
                match wire.last_mut() {
                    Some(WireMessage {
                        role: "user",
                        content: MessageContent::Blocks(blocks),
                    }) if blocks.iter().all(|b| b.kind == "tool_result") => blocks.push(block),
                    _ => wire.push(WireMessage {
                        role: "user",
                        content: MessageContent::Blocks(vec![block]),
                    }),
                }
            }
        }
    }

    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, wire)
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Option<Vec<ContentBlock>>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_is_extracted() {
        let (system, wire) = split_system(&[Message::system("S"), Message::user("U")]);
        assert_eq!(system.as_deref(), Some("S"));
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!([{"role": "user", "content": "U"}])
        );
    }

    #[test]
    fn test_no_system_prompt() {
        let (system, wire) = split_system(&[Message::user("U")]);
        assert!(system.is_none());
        assert_eq!(wire.len(), 1);
    }

    #[test]
    fn test_openai_shaped_history_is_converted() {
        let messages = vec![
            Message::user("time and math?"),
            Message::assistant_tool_calls(
                "",
                vec![
                    ToolCall {
                        id: "a".into(),
                        name: "datetime".into(),
                        arguments: json!({}),
                    },
                    ToolCall {
                        id: "b".into(),
                        name: "calculate".into(),
                        arguments: json!({"expression": "1+1"}),
                    },
                ],
            ),
            Message::tool("a", "{\"datetime\":\"now\"}"),
            Message::tool("b", "{\"result\":2}"),
        ];
        let (_, wire) = split_system(&messages);
        assert_eq!(wire.len(), 3);

        let assistant = serde_json::to_value(&wire[1]).unwrap();
        assert_eq!(assistant["content"][0]["type"], "tool_use");
        assert_eq!(assistant["content"][1]["input"]["expression"], "1+1");

        let results = serde_json::to_value(&wire[2]).unwrap();
        assert_eq!(results["role"], "user");
        assert_eq!(results["content"].as_array().unwrap().len(), 2);
        assert_eq!(results["content"][1]["tool_use_id"], "b");
    }

    #[test]
    fn test_headers() {
        let headers = AnthropicAdapter::headers("sk-ant");
        assert_eq!(headers, vec!["x-api-key: sk-ant", "anthropic-version: 2023-06-01"]);
    }
}
