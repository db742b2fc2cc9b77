//! Test client settings, from command-line flags or the environment.

use clap::Parser;

use super::error::{ClientError, ClientResult};

const MCP_PATH: &str = "/mcp";

/// Interactive client for the Spotify MCP server.
#[derive(Debug, Clone, Parser)]
#[command(name = "spotify-mcp-client", version, about)]
pub struct ClientArgs {
    /// Base URL of the MCP server; `/mcp` is appended unless present.
    #[arg(long, env = "MCP_URL")]
    pub url: String,

    /// Google API key for the Gemini agent. Without it only `/call` works.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Gemini model used by the agent.
    #[arg(long, env = "MCP_CLIENT_MODEL", default_value = "gemini-2.5-flash")]
    pub model: String,

    /// Gemini API base URL.
    #[arg(
        long,
        env = "MCP_GEMINI_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub gemini_url: String,

    /// Maximum tool-call rounds per prompt.
    #[arg(long, default_value_t = 8)]
    pub max_steps: usize,

    /// Timeout of each Gemini request, in seconds.
    #[arg(long, default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "MCP_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl ClientArgs {
    /// The MCP endpoint to connect to.
    pub fn endpoint(&self) -> ClientResult<String> {
        mcp_endpoint(&self.url)
    }

    /// The Google API key, if one was given and is not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.google_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Normalize a server URL to its MCP endpoint.
pub fn mcp_endpoint(url: &str) -> ClientResult<String> {
    let base = url.trim().trim_end_matches('/');
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ClientError::Config(format!(
            "MCP_URL must be an http(s) URL, got '{}'",
            url
        )));
    }
    if base.ends_with(MCP_PATH) {
        Ok(base.to_string())
    } else {
        Ok(format!("{}{}", base, MCP_PATH))
    }
}
