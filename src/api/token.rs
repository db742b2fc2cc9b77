//! Spotify access token cache.
//!
//! The server holds a long-lived refresh token and trades it for short-lived
//! access tokens on demand. At most one access token is cached; a caller that
//! finds it absent or stale performs the refresh while holding the state lock,
//! so concurrent callers wait for that single refresh and then reuse its result.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::http::transport_error;
use crate::domains::tools::{ToolError, ToolResult};

const PROVIDER: &str = "spotify accounts";

/// Response body of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    /// Present when the provider rotates the refresh token.
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Error body of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

#[derive(Debug)]
struct TokenState {
    refresh_token: String,
    access: Option<AccessToken>,
}

/// Produces valid Spotify access tokens, refreshing lazily.
pub struct TokenManager {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    margin: Duration,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        margin: Duration,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            margin,
            state: Mutex::new(TokenState {
                refresh_token: refresh_token.into(),
                access: None,
            }),
        }
    }

    /// Return a bearer token valid for at least the safety margin.
    pub async fn access_token(&self) -> ToolResult<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.access.as_ref().filter(|t| t.is_fresh(self.margin)) {
            return Ok(token.value.clone());
        }

        let fresh = self.refresh(&state.refresh_token).await?;
        let expires_at = Instant::now() + Duration::from_secs(fresh.expires_in);
        debug!("Spotify access token refreshed, valid for {}s", fresh.expires_in);

        if let Some(rotated) = fresh.refresh_token.filter(|t| !t.is_empty()) {
            debug!("Spotify rotated the refresh token");
            state.refresh_token = rotated;
        }

        state.access = Some(AccessToken {
            value: fresh.access_token.clone(),
            expires_at,
        });
        Ok(fresh.access_token)
    }

    /// Drop the cached access token so the next call refreshes.
    pub async fn invalidate(&self) {
        self.state.lock().await.access = None;
    }

    async fn refresh(&self, refresh_token: &str) -> ToolResult<TokenResponse> {
        if self.client_id.is_empty() || self.client_secret.is_empty() || refresh_token.is_empty() {
            return Err(ToolError::auth(
                "Spotify client id, client secret and refresh token must all be configured",
            ));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}: {}", status, body),
            };
            error!("Spotify token refresh rejected: {}", message);
            return Err(ToolError::auth(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| ToolError::auth(format!("Malformed token response: {}", e)))
    }

    /// Force the cached token to look expired.
    #[cfg(test)]
    pub(crate) async fn expire_now(&self) {
        if let Some(token) = self.state.lock().await.access.as_mut() {
            token.expires_at = Instant::now();
        }
    }
}
