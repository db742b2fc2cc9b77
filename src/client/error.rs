//! Test client errors.

use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid client settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connecting to or talking with the MCP server failed.
    #[error("MCP error: {0}")]
    Mcp(String),

    /// The Gemini API rejected a request.
    #[error("Gemini error ({status}): {message}")]
    Gemini { status: u16, message: String },

    /// The model did not finish within the allowed number of tool rounds.
    #[error("Agent stopped after {0} tool rounds without a final answer")]
    TooManySteps(usize),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
