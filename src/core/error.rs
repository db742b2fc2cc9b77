//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type for server startup and the
//! transport lifecycle. Tool invocations never surface here: their failures
//! are reported to the caller as tool results (see `domains::tools::ToolError`).

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failures (bind, serve, protocol).
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Building the outbound HTTP client failed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
