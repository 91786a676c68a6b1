//! # chat-runtime
//!
//! Concrete adapters for the `chat-core` contracts.
//!
//! ## Providers
//!
//! - **OpenAI**, **OpenRouter**, **Custom**: one shared chat-completions loop,
//!   parameterized by an [`openai::EndpointResolver`]
//! - **Anthropic**: Messages API with content-block tool use
//! - **Ollama**: single-shot local inference, no tool support
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_runtime::{HttpTransport, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_env();
//! let registry = ProviderRegistry::new(Arc::new(HttpTransport::new()), &config);
//! let adapter = registry.get("anthropic")?;
//! let response = adapter.call(&mut conversation, &options, &tools).await?;
//! ```

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod transport;

pub use anthropic::AnthropicAdapter;
pub use config::RuntimeConfig;
pub use ollama::OllamaAdapter;
pub use openai::{
    CustomAdapter, EndpointResolver, OpenAiAdapter, OpenAiCompatible, OpenRouterAdapter,
};
pub use registry::{ProviderKind, ProviderRegistry};
pub use transport::HttpTransport;

// Re-export core types for convenience
pub use chat_core::{
    CallOptions, ChatError, Conversation, Message, ProviderAdapter, ProviderResponse, Result,
    Role, Tool, ToolExecutor, ToolRegistry,
};
