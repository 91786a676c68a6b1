//! chat CLI
//!
//! Runs one tool-augmented conversation turn against a configured provider
//! and prints the answer.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_core::{
    builtin::{CalculatorTool, DateTimeTool},
    message::{Conversation, Message},
    provider::ProviderAdapter,
    tool::ToolRegistry,
};
use chat_runtime::{HttpTransport, ProviderRegistry, RuntimeConfig};

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout carries only the answer)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = RuntimeConfig::from_env();

    let registry = ProviderRegistry::new(Arc::new(HttpTransport::new()), &config);
    let adapter = registry.get_kind(args.provider)?;

    // Initialize tools
    let mut tools = ToolRegistry::new();
    tools.register(DateTimeTool);
    tools.register(CalculatorTool);

    let options = args.call_options(|key| std::env::var(key).ok());
    report_setup(adapter.as_ref(), &tools, options.tools_enabled);

    let mut conversation = Conversation::new();
    if let Some(system) = &args.system {
        conversation.push(Message::system(system.as_str()));
    }
    conversation.push(Message::user(args.prompt_text()));

    let response = adapter.call(&mut conversation, &options, &tools).await?;

    if response.truncated {
        tracing::warn!(iterations = response.iterations, "Stopped at the tool iteration cap");
    }
    tracing::info!(
        provider = adapter.name(),
        tokens = response.tokens,
        iterations = response.iterations,
        messages = conversation.len(),
        "Done"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.content);
    }

    Ok(())
}

fn report_setup(adapter: &dyn ProviderAdapter, tools: &ToolRegistry, tools_enabled: bool) {
    tracing::info!(provider = adapter.name(), "Using provider");
    if !tools_enabled {
        return;
    }
    if adapter.supports_tools() {
        tracing::info!("Offering {} tools: {}", tools.len(), tools.names().join(", "));
    } else {
        tracing::info!(
            provider = adapter.name(),
            "Provider has no tool support; tools will not be offered"
        );
    }
}
