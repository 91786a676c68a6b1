//! Command-line arguments

use chat_core::provider::CallOptions;
use chat_runtime::ProviderKind;
use clap::Parser;

/// Ask an LLM provider a question, letting it call the built-in tools.
#[derive(Debug, Parser)]
#[command(name = "chat", version, about)]
pub struct Args {
    /// Provider: openai, anthropic, ollama, openrouter or custom
    #[arg(short, long, env = "CHAT_PROVIDER", default_value = "openai")]
    pub provider: ProviderKind,

    /// Model identifier
    #[arg(short, long, env = "CHAT_MODEL")]
    pub model: String,

    /// API key; defaults to the provider's usual environment variable
    #[arg(long)]
    pub api_key: Option<String>,

    /// Base URL for custom and ollama providers
    #[arg(long, env = "CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Maximum tokens per round-trip
    #[arg(long, default_value_t = 1024)]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(short, long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Do not offer tools to the model
    #[arg(long)]
    pub no_tools: bool,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,

    /// The question to ask
    #[arg(required = true)]
    pub prompt: Vec<String>,
}

impl Args {
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }

    /// Build call options, reading the API key through `lookup` when it
    /// was not given on the command line.
    pub fn call_options(&self, lookup: impl Fn(&str) -> Option<String>) -> CallOptions {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| api_key_var(self.provider).and_then(lookup))
            .unwrap_or_default();

        let mut options = CallOptions::new(api_key, self.model.clone())
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_tools(!self.no_tools);
        options.base_url.clone_from(&self.base_url);
        options
    }
}

/// Environment variable conventionally holding each provider's key
pub const fn api_key_var(kind: ProviderKind) -> Option<&'static str> {
    match kind {
        ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
        ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
        ProviderKind::Custom => Some("CUSTOM_API_KEY"),
        ProviderKind::Ollama => None,
    }
}
