//! Tool-specific error types.

use rmcp::model::CallToolResult;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Result type returned by tool handlers and the API clients they call.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors that can occur during tool operations.
///
/// Every variant is reported back to the caller as a structured tool result;
/// none of them is fatal to the server.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// Bad or missing arguments, caught before any network call.
    #[error("Invalid arguments: {0}")]
    Validation(String),

    /// Access token acquisition or refresh failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A provider answered with a failure.
    #[error("{provider} API error{}: {message}", status_suffix(.status))]
    Api {
        provider: &'static str,
        status: Option<u16>,
        message: String,
        reason: Option<String>,
    },

    /// An external call exceeded its time budget.
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// Unknown tool name or missing resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new provider error.
    pub fn api(provider: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            provider,
            status,
            message: message.into(),
            reason: None,
        }
    }

    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::Api { .. } => "api_error",
            Self::Timeout(_) => "timeout_error",
            Self::NotFound(_) => "not_found_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Structured payload relayed to the caller.
    pub fn to_payload(&self) -> Value {
        let mut error = Map::new();
        error.insert("kind".into(), json!(self.kind()));
        error.insert("message".into(), json!(self.to_string()));

        if let Self::Api {
            provider,
            status,
            reason,
            ..
        } = self
        {
            error.insert("provider".into(), json!(provider));
            if let Some(status) = status {
                error.insert("status".into(), json!(status));
            }
            if let Some(reason) = reason {
                error.insert("reason".into(), json!(reason));
            }
        }

        json!({ "error": error })
    }

    /// Convert into an MCP tool result flagged as an error.
    pub fn into_call_result(self) -> CallToolResult {
        CallToolResult::structured_error(self.to_payload())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
