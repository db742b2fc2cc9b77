//! MCP Server Entry Point
//!
//! Loads configuration (failing fast on missing credentials), initializes
//! logging, and starts the server with the configured transport.

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use spotify_mcp_server::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Fail before any transport starts if credentials are missing
    let config = Config::from_env()?;

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!("Transport: {}", config.transport.description());
    info!(
        "Outbound calls time out after {}s; token refresh margin {}s",
        config.api.request_timeout_secs, config.api.token_refresh_margin_secs
    );

    let server = McpServer::new(config.clone())?;
    info!("Server initialized with {} tools", server.tool_count());

    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; in stdio mode stdout carries the MCP protocol.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
