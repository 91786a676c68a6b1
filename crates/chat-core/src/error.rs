//! Error Types

use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Chat error types
#[derive(Error, Debug)]
pub enum ChatError {
    /// Network-level failure (DNS, connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A provider call failed, either in transport or with an error body
    #[error("Provider call failed ({provider}): {message}")]
    ProviderCall {
        provider: &'static str,
        message: String,
    },

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// No adapter is registered under this name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Configuration or call option error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl ChatError {
    /// Wrap any error as a provider call failure for `provider`.
    pub fn provider_call(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ProviderCall {
            provider,
            message: message.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// Adapters never retry on their own; this is a hint for callers.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => {
                "The AI service could not be reached. Please try again.".into()
            }
            Self::ProviderCall { message, .. } => {
                format!("The AI service encountered an error: {message}")
            }
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::UnknownProvider(name) => format!("The AI provider '{name}' is not supported."),
            Self::Config(msg) => format!("Invalid configuration: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
