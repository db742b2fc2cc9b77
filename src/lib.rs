//! Spotify MCP Server Library
//!
//! Exposes Spotify Web API and Last.fm operations as MCP tools, plus a small
//! interactive client for exercising them.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and transports
//! - **api**: outbound HTTP: token cache, Spotify and Last.fm clients, payload models
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the tool table, argument validation and result shaping
//! - **client**: the test client (MCP session, Gemini agent, REPL)
//!
//! # Example
//!
//! ```rust,no_run
//! use spotify_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod core;
pub mod domains;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
