//! # chat-core
//!
//! Provider-agnostic contracts for tool-augmented LLM conversations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ProviderAdapter                          │
//! │  ┌──────────────┐  ┌────────────────┐  ┌─────────────────┐   │
//! │  │ Orchestration│  │  ToolExecutor  │  │    Transport    │   │
//! │  │     Loop     │──│ (ToolRegistry) │  │   (JSON POST)   │   │
//! │  └──────────────┘  └────────────────┘  └─────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete adapters (OpenAI-compatible, Anthropic, Ollama) and the HTTP
//! transport live in `chat-runtime`; this crate only defines the seams and
//! the shared message model.

pub mod builtin;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod transport;

pub use error::{ChatError, Result};
pub use message::{ContentBlock, Conversation, Message, MessageContent, Role};
pub use provider::{CallOptions, ProviderAdapter, ProviderResponse};
pub use tool::{Tool, ToolCall, ToolExecutor, ToolRegistry, ToolResult, ToolSchema};
pub use transport::Transport;
