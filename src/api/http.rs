//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::domains::tools::ToolError;

/// Build the HTTP client used for every outbound call.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("spotify-mcp-server/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Map a transport-level `reqwest` failure to a tool error.
pub(crate) fn transport_error(provider: &'static str, err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        warn!("Request to {} timed out", provider);
        return ToolError::Timeout(provider.to_string());
    }
    warn!("Request to {} failed: {}", provider, err);
    ToolError::api(provider, err.status().map(|s| s.as_u16()), err.to_string())
}
