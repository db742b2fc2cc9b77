//! Shared state handed to every tool invocation.

use std::sync::Arc;

use crate::api::{LastfmClient, SpotifyClient, TokenManager, build_http_client};
use crate::core::Config;

/// Provider clients used by the tool handlers.
///
/// Cloning is cheap; the Spotify client (and with it the access token cache)
/// is shared by every clone.
#[derive(Clone)]
pub struct ToolContext {
    spotify: Arc<SpotifyClient>,
    lastfm: Arc<LastfmClient>,
}

impl ToolContext {
    pub fn new(spotify: SpotifyClient, lastfm: LastfmClient) -> Self {
        Self {
            spotify: Arc::new(spotify),
            lastfm: Arc::new(lastfm),
        }
    }

    /// Wire the provider clients from configuration.
    pub fn from_config(config: &Config) -> crate::core::Result<Self> {
        let http = build_http_client(config.api.request_timeout())?;
        let credentials = &config.credentials;

        let tokens = TokenManager::new(
            http.clone(),
            &config.api.spotify_token_url,
            &credentials.spotify_client_id,
            &credentials.spotify_client_secret,
            &credentials.spotify_refresh_token,
            config.api.token_refresh_margin(),
        );
        let spotify = SpotifyClient::new(http.clone(), &config.api.spotify_api_url, tokens);
        let lastfm = LastfmClient::new(http, &config.api.lastfm_api_url, &credentials.lastfm_api_key);

        Ok(Self::new(spotify, lastfm))
    }

    pub fn spotify(&self) -> &SpotifyClient {
        &self.spotify
    }

    pub fn lastfm(&self) -> &LastfmClient {
        &self.lastfm
    }
}
