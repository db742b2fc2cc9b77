//! Last.fm API client (API key authentication, no OAuth).

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::transport_error;
use super::model::LastfmErrorBody;
use crate::domains::tools::{ToolError, ToolResult};

const PROVIDER: &str = "lastfm";

/// Access to the Last.fm `2.0` REST endpoint.
pub struct LastfmClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl LastfmClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Call a Last.fm method and decode the result.
    ///
    /// Last.fm reports failures such as unknown artists in the body, often
    /// with a 200 status, so the body is checked for an `error` member before
    /// decoding. A body that lacks the expected container is also an error.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> ToolResult<T> {
        if self.api_key.is_empty() {
            return Err(ToolError::auth("Last.fm API key is not configured"));
        }

        debug!("Last.fm {}", method);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("autocorrect", "1"),
            ])
            .query(params)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(ToolError::api(
                    PROVIDER,
                    Some(status.as_u16()),
                    body.trim().to_string(),
                ));
            }
            Err(e) => {
                return Err(ToolError::api(
                    PROVIDER,
                    Some(status.as_u16()),
                    format!("Unexpected response payload: {}", e),
                ));
            }
        };

        if let Ok(err) = serde_json::from_value::<LastfmErrorBody>(value.clone()) {
            warn!("Last.fm {} failed: {} ({})", method, err.message, err.error);
            return Err(ToolError::Api {
                provider: PROVIDER,
                status: Some(status.as_u16()),
                message: err.message,
                reason: Some(format!("lastfm_error_{}", err.error)),
            });
        }

        if !status.is_success() {
            return Err(ToolError::api(
                PROVIDER,
                Some(status.as_u16()),
                body.trim().to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|e| {
            ToolError::api(
                PROVIDER,
                Some(status.as_u16()),
                format!("Unexpected response payload for {}: {}", method, e),
            )
        })
    }
}
