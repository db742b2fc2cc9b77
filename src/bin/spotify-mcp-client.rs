//! Test client entry point.
//!
//! Connects to the server's MCP endpoint, lists the tools and starts the
//! interactive loop. The Gemini agent is enabled when a Google API key is set.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use spotify_mcp_server::client::{AgentSettings, ClientArgs, GeminiAgent, McpSession, Repl};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = ClientArgs::parse();

    init_logging(&args.log_level);

    let endpoint = args.endpoint()?;
    let session = McpSession::connect(&endpoint).await?;
    info!("Connected to {}", endpoint);

    let agent = match args.api_key() {
        Some(api_key) => Some(GeminiAgent::new(
            AgentSettings {
                api_key: api_key.to_string(),
                base_url: args.gemini_url.clone(),
                model: args.model.clone(),
                max_steps: args.max_steps,
                request_timeout: Duration::from_secs(args.request_timeout_secs),
            },
            session.tools(),
        )?),
        None => None,
    };

    Repl::new(session, agent).run().await?;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
