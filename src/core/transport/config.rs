//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// Streamable HTTP transport.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path the MCP endpoint is mounted under.
    #[serde(default = "default_mcp_path")]
    pub path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_mcp_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
const DEFAULT_HTTP_PORT: u16 = 8080;

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            host: default_host(),
            path: default_mcp_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from a key lookup (normally the environment).
    ///
    /// `MCP_TRANSPORT` selects the transport; unset or empty means the
    /// default. For HTTP, `MCP_HTTP_PORT` wins over the platform-provided
    /// `PORT`. Unknown transports and malformed ports are rejected.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = lookup("MCP_TRANSPORT")
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match transport.as_str() {
            "" => Ok(Self::default()),
            #[cfg(feature = "stdio")]
            "stdio" => Ok(Self::Stdio),
            #[cfg(feature = "http")]
            "http" => {
                let port = match lookup("MCP_HTTP_PORT") {
                    Some(raw) => parse_port("MCP_HTTP_PORT", &raw)?,
                    None => match lookup("PORT") {
                        Some(raw) => parse_port("PORT", &raw)?,
                        None => DEFAULT_HTTP_PORT,
                    },
                };
                let host = lookup("MCP_HTTP_HOST").unwrap_or_else(default_host);
                let path = lookup("MCP_HTTP_PATH")
                    .map(|p| normalize_path(&p))
                    .unwrap_or_else(default_mcp_path);
                let enable_cors = lookup("MCP_HTTP_CORS")
                    .map(|v| v.to_lowercase() != "false" && v != "0")
                    .unwrap_or(true);
                Ok(Self::Http(HttpConfig {
                    port,
                    host,
                    path,
                    enable_cors,
                }))
            }
            other => Err(Error::config(format!(
                "MCP_TRANSPORT '{}' is not supported by this build (expected one of: {})",
                other,
                supported_transports().join(", ")
            ))),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!(
                "Streamable HTTP on {}:{}{}",
                cfg.host, cfg.port, cfg.path
            ),
        }
    }
}

fn supported_transports() -> Vec<&'static str> {
    let mut names = Vec::new();
    if cfg!(feature = "stdio") {
        names.push("stdio");
    }
    if cfg!(feature = "http") {
        names.push("http");
    }
    names
}

#[cfg(feature = "http")]
fn parse_port(name: &str, raw: &str) -> Result<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(Error::config(format!(
            "{} must be a port number between 1 and 65535, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(feature = "http")]
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        default_mcp_path()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
