//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated from
//! environment variables (optionally seeded from a `.env` file) on top of
//! defaults. Missing provider credentials are reported at startup, not at the
//! first tool invocation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::transport::TransportConfig;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// Provider endpoints and outbound call policy.
    pub api: ApiConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Spotify application client id (`CLIENT_ID`).
    pub spotify_client_id: String,

    /// Spotify application client secret (`CLIENT_SECRET`).
    pub spotify_client_secret: String,

    /// Long-lived Spotify refresh token (`REFRESH_TOKEN`).
    pub spotify_refresh_token: String,

    /// Last.fm API key (`LASTFM_API_KEY`).
    pub lastfm_api_key: String,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() { "[MISSING]" } else { "[REDACTED]" }
        }

        f.debug_struct("CredentialsConfig")
            .field("spotify_client_id", &redact(&self.spotify_client_id))
            .field("spotify_client_secret", &redact(&self.spotify_client_secret))
            .field("spotify_refresh_token", &redact(&self.spotify_refresh_token))
            .field("lastfm_api_key", &redact(&self.lastfm_api_key))
            .finish()
    }
}

impl CredentialsConfig {
    /// Names of required variables that are missing or empty.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (ENV_CLIENT_ID, &self.spotify_client_id),
            (ENV_CLIENT_SECRET, &self.spotify_client_secret),
            (ENV_REFRESH_TOKEN, &self.spotify_refresh_token),
            (ENV_LASTFM_API_KEY, &self.lastfm_api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Provider endpoints and outbound call policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Spotify Web API.
    pub spotify_api_url: String,

    /// Spotify OAuth token endpoint.
    pub spotify_token_url: String,

    /// Last.fm REST endpoint.
    pub lastfm_api_url: String,

    /// Timeout applied to every external call, in seconds.
    pub request_timeout_secs: u64,

    /// Access tokens are treated as expired this many seconds early.
    pub token_refresh_margin_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            spotify_api_url: "https://api.spotify.com/v1".to_string(),
            spotify_token_url: "https://accounts.spotify.com/api/token".to_string(),
            lastfm_api_url: "https://ws.audioscrobbler.com/2.0/".to_string(),
            request_timeout_secs: 10,
            token_refresh_margin_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "spotify-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

const ENV_CLIENT_ID: &str = "CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "CLIENT_SECRET";
const ENV_REFRESH_TOKEN: &str = "REFRESH_TOKEN";
const ENV_LASTFM_API_KEY: &str = "LASTFM_API_KEY";

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Fails if any required credential is missing or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = lookup("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_lookup(&lookup)?;

        config.credentials = CredentialsConfig {
            spotify_client_id: lookup(ENV_CLIENT_ID).unwrap_or_default(),
            spotify_client_secret: lookup(ENV_CLIENT_SECRET).unwrap_or_default(),
            spotify_refresh_token: lookup(ENV_REFRESH_TOKEN).unwrap_or_default(),
            lastfm_api_key: lookup(ENV_LASTFM_API_KEY).unwrap_or_default(),
        };

        let missing = config.credentials.missing();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required environment variable(s): {}",
                missing.join(", ")
            )));
        }

        if let Some(url) = lookup("MCP_SPOTIFY_API_URL") {
            config.api.spotify_api_url = url;
        }
        if let Some(url) = lookup("MCP_SPOTIFY_TOKEN_URL") {
            config.api.spotify_token_url = url;
        }
        if let Some(url) = lookup("MCP_LASTFM_API_URL") {
            config.api.lastfm_api_url = url;
        }

        if let Some(raw) = lookup("MCP_REQUEST_TIMEOUT_SECS") {
            config.api.request_timeout_secs = parse_positive("MCP_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("MCP_TOKEN_REFRESH_MARGIN_SECS") {
            config.api.token_refresh_margin_secs = raw.trim().parse().map_err(|_| {
                Error::config(format!(
                    "MCP_TOKEN_REFRESH_MARGIN_SECS must be a number of seconds, got '{}'",
                    raw
                ))
            })?;
        }

        Ok(config)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(Error::config(format!(
            "{} must be a positive number of seconds, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("CLIENT_ID", "id"),
        ("CLIENT_SECRET", "secret"),
        ("REFRESH_TOKEN", "refresh"),
        ("LASTFM_API_KEY", "lastfm"),
    ];

    #[test]
    fn test_credentials_from_lookup() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.credentials.spotify_client_id, "id");
        assert_eq!(config.credentials.lastfm_api_key, "lastfm");
        assert_eq!(config.api.request_timeout_secs, 10);
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let err = Config::from_lookup(lookup_from(&[("CLIENT_ID", "id"), ("REFRESH_TOKEN", " ")]))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CLIENT_SECRET"));
        assert!(msg.contains("REFRESH_TOKEN"));
        assert!(msg.contains("LASTFM_API_KEY"));
        assert!(!msg.contains("CLIENT_ID,"));
    }

    #[test]
    fn test_timeout_override() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MCP_REQUEST_TIMEOUT_SECS", "3"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.api.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_bad_transport_fails_config() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MCP_TRANSPORT", "websocket"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("websocket")));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MCP_REQUEST_TIMEOUT_SECS", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_endpoint_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MCP_SPOTIFY_API_URL", "http://localhost:9999/v1"));
        pairs.push(("MCP_LASTFM_API_URL", "http://localhost:9999/2.0/"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.api.spotify_api_url, "http://localhost:9999/v1");
        assert_eq!(config.api.lastfm_api_url, "http://localhost:9999/2.0/");
        assert_eq!(
            config.api.spotify_token_url,
            "https://accounts.spotify.com/api/token"
        );
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            spotify_client_secret: "super_secret_key".to_string(),
            ..Default::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(debug_str.contains("MISSING"));
        assert!(!debug_str.contains("super_secret_key"));
    }
}
