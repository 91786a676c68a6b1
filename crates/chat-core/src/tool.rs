//! Tool System
//!
//! Tool calls, tool results, the two tool-definition dialects and the
//! `ToolExecutor` seam the orchestration loops call into.
//! `ToolRegistry` is the stock executor: tools are registered at runtime
//! and looked up by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ChatError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-issued id, echoed back in the matching result
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Arguments object
    #[serde(default)]
    pub arguments: Value,
}

/// Result of one tool call, ready to be fed back to the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the originating tool call
    pub tool_call_id: String,

    /// JSON-serialized result or error payload
    pub content: String,
}

impl ToolResult {
    /// Build a result from a tool outcome.
    ///
    /// Failures become `{"error": "Tool execution failed: ..."}` so the model
    /// can see and react to them.
    pub fn from_outcome(tool_call_id: impl Into<String>, outcome: Result<Value>) -> Self {
        let payload = match outcome {
            Ok(value) => value,
            Err(err) => {
                json!({ "error": format!("Tool execution failed: {}", failure_detail(&err)) })
            }
        };
        Self {
            tool_call_id: tool_call_id.into(),
            content: payload.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        serde_json::from_str::<Value>(&self.content)
            .ok()
            .and_then(|v| v.as_object().map(|o| o.contains_key("error")))
            .unwrap_or(false)
    }
}

fn failure_detail(err: &ChatError) -> String {
    match err {
        ChatError::ToolExecution(msg) | ChatError::ToolValidation(msg) | ChatError::Other(msg) => {
            msg.clone()
        }
        ChatError::ToolNotFound(name) => format!("unknown tool '{name}'"),
        other => other.to_string(),
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            enum_values: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }
}

/// Dialect-neutral tool description
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Parameters as a JSON Schema object
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(param.param_type.clone()));
            prop.insert("description".into(), Value::String(param.description.clone()));
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(prop));
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// OpenAI-style tool definition (`function` wrapper)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenAiToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<&ToolSchema> for OpenAiToolDefinition {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            kind: "function".into(),
            function: FunctionDefinition {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.json_schema(),
            },
        }
    }
}

/// Anthropic-style tool definition (`input_schema`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnthropicToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl From<&ToolSchema> for AnthropicToolDefinition {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            name: schema.name.clone(),
            description: schema.description.clone(),
            input_schema: schema.json_schema(),
        }
    }
}

/// What the orchestration loops need from the application's tools.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Dialect-neutral schemas of every callable tool
    fn schemas(&self) -> Vec<ToolSchema>;

    /// Tool definitions in the OpenAI dialect
    fn tool_definitions(&self) -> Vec<OpenAiToolDefinition> {
        self.schemas().iter().map(OpenAiToolDefinition::from).collect()
    }

    /// Tool definitions in the Anthropic dialect
    fn anthropic_tool_definitions(&self) -> Vec<AnthropicToolDefinition> {
        self.schemas()
            .iter()
            .map(AnthropicToolDefinition::from)
            .collect()
    }

    /// Run the named tool. Errors are reported back to the model, never
    /// propagated out of an orchestration call.
    async fn execute_tool(&self, name: &str, arguments: &Value) -> Result<Value>;
}

/// Run a tool call through `executor`, converting the outcome to a result.
pub async fn run_tool_call(executor: &dyn ToolExecutor, call: &ToolCall) -> ToolResult {
    tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");
    let outcome = executor.execute_tool(&call.name, &call.arguments).await;
    if let Err(err) = &outcome {
        tracing::warn!(tool = %call.name, error = %err, "Tool execution failed");
    }
    ToolResult::from_outcome(call.id.clone(), outcome)
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: &Value) -> Result<Value>;

    /// Validate arguments before execution (optional)
    fn validate(&self, arguments: &Value) -> Result<()> {
        let schema = self.schema();
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ChatError::ToolValidation(
                    "Arguments must be a JSON object".into(),
                ));
            }
        };

        for param in &schema.parameters {
            if param.required && !args.contains_key(&param.name) {
                return Err(ChatError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    async fn execute_tool(&self, name: &str, arguments: &Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ChatError::ToolNotFound(name.to_string()))?;

        tool.validate(arguments)?;
        tool.execute(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the input back".into(),
                parameters: vec![ParameterSchema::new("text", "string", "Text to echo").required()],
            }
        }

        async fn execute(&self, arguments: &Value) -> Result<Value> {
            Ok(json!({ "echo": arguments["text"] }))
        }
    }

    #[test]
    fn test_dialects_share_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let openai = registry.tool_definitions();
        assert_eq!(openai[0].kind, "function");
        assert_eq!(openai[0].function.name, "echo");
        assert_eq!(openai[0].function.parameters["required"], json!(["text"]));

        let anthropic = registry.anthropic_tool_definitions();
        assert_eq!(anthropic[0].name, "echo");
        assert_eq!(anthropic[0].input_schema, openai[0].function.parameters);
        assert_eq!(
            anthropic[0].input_schema["properties"]["text"]["type"],
            "string"
        );
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let out = registry
            .execute_tool("echo", &json!({"text": "hi"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"echo": "hi"}));

        let missing = registry.execute_tool("echo", &json!({})).await;
        assert!(matches!(missing, Err(ChatError::ToolValidation(_))));

        let unknown = registry.execute_tool("nope", &json!({})).await;
        assert!(matches!(unknown, Err(ChatError::ToolNotFound(_))));
    }

    #[test]
    fn test_error_outcome_is_wrapped() {
        let result = ToolResult::from_outcome(
            "call_1",
            Err(ChatError::ToolExecution("disk full".into())),
        );
        assert_eq!(result.tool_call_id, "call_1");
        assert!(result.is_error());
        let payload: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(payload["error"], "Tool execution failed: disk full");
    }

    #[test]
    fn test_success_outcome_is_serialized() {
        let result = ToolResult::from_outcome("call_2", Ok(json!({"items": [1, 2]})));
        assert!(!result.is_error());
        assert_eq!(result.content, r#"{"items":[1,2]}"#);
    }
}
