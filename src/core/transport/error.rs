//! Transport error types.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while starting or running a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error during transport.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// MCP session initialization failed.
    #[error("Server initialization error: {0}")]
    InitError(String),

    /// The running MCP service terminated abnormally.
    #[error("Service error: {0}")]
    ServiceError(String),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    /// Create an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::InitError(msg.into())
    }
}
