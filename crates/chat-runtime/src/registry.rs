//! Provider Selection
//!
//! Maps configured provider names to adapters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chat_core::{
    error::{ChatError, Result},
    provider::ProviderAdapter,
    transport::Transport,
};

use crate::anthropic::AnthropicAdapter;
use crate::config::RuntimeConfig;
use crate::ollama::OllamaAdapter;
use crate::openai::{
    CustomAdapter, CustomEndpoint, OpenAiAdapter, OpenAiEndpoint, OpenRouterAdapter,
    OpenRouterEndpoint,
};

/// Supported backend families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Ollama,
    OpenRouter,
    Custom,
}

impl ProviderKind {
    pub const ALL: [Self; 5] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Ollama,
        Self::OpenRouter,
        Self::Custom,
    ];

    /// Name matched against configuration; equals the adapter's `name()`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
            Self::OpenRouter => "openrouter",
            Self::Custom => "custom",
        }
    }

    /// Construct the adapter for this kind
    pub fn build(
        self,
        transport: Arc<dyn Transport>,
        config: &RuntimeConfig,
    ) -> Arc<dyn ProviderAdapter> {
        match self {
            Self::OpenAi => Arc::new(OpenAiAdapter::new(transport, OpenAiEndpoint, config)),
            Self::OpenRouter => Arc::new(OpenRouterAdapter::new(
                transport,
                OpenRouterEndpoint::from_config(config),
                config,
            )),
            Self::Custom => Arc::new(CustomAdapter::new(transport, CustomEndpoint, config)),
            Self::Anthropic => Arc::new(AnthropicAdapter::new(transport, config)),
            Self::Ollama => Arc::new(OllamaAdapter::new(transport, config)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChatError::UnknownProvider(wanted.to_string()))
    }
}

/// One adapter per provider kind over a shared transport
pub struct ProviderRegistry {
    adapters: BTreeMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new(transport: Arc<dyn Transport>, config: &RuntimeConfig) -> Self {
        let adapters = ProviderKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.build(Arc::clone(&transport), config)))
            .collect();
        Self { adapters }
    }

    /// Adapter for a configured provider name
    pub fn get(&self, name: &str) -> Result<Arc<dyn ProviderAdapter>> {
        let kind: ProviderKind = name.parse()?;
        self.get_kind(kind)
    }

    pub fn get_kind(&self, kind: ProviderKind) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(&kind)
            .cloned()
            .ok_or_else(|| ChatError::UnknownProvider(kind.to_string()))
    }

    /// Registered provider names
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.values().map(|a| a.name()).collect()
    }
}
