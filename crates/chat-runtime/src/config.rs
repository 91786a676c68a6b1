//! Runtime configuration shared by the adapters.

use std::time::Duration;

/// Default per-request timeout for chat endpoints
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default local Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Adapter configuration
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Timeout applied to every provider round-trip
    pub timeout: Duration,

    /// Ollama base URL used when a call does not supply one
    pub ollama_base_url: String,

    /// `HTTP-Referer` attribution sent to OpenRouter
    pub openrouter_referer: String,

    /// `X-Title` attribution sent to OpenRouter
    pub openrouter_title: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ollama_base_url: DEFAULT_OLLAMA_URL.into(),
            openrouter_referer: "http://localhost".into(),
            openrouter_title: "tool-chat".into(),
        }
    }
}

impl RuntimeConfig {
    /// Read overrides from the environment, falling back to defaults.
    ///
    /// `CHAT_TIMEOUT_SECS`, `OLLAMA_BASE_URL`, `OPENROUTER_REFERER`,
    /// `OPENROUTER_TITLE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup("CHAT_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.timeout, Duration::from_secs);

        Self {
            timeout,
            ollama_base_url: lookup("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            openrouter_referer: lookup("OPENROUTER_REFERER").unwrap_or(defaults.openrouter_referer),
            openrouter_title: lookup("OPENROUTER_TITLE").unwrap_or(defaults.openrouter_title),
        }
    }
}
