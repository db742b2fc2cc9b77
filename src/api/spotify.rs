//! Spotify Web API client.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::http::transport_error;
use super::model::SpotifyErrorBody;
use super::token::TokenManager;
use crate::domains::tools::{ToolError, ToolResult};

const PROVIDER: &str = "spotify";

/// Authenticated access to the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    base_url: String,
    tokens: TokenManager,
}

impl SpotifyClient {
    pub fn new(http: Client, base_url: impl Into<String>, tokens: TokenManager) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// `GET {base}{path}` and decode the JSON body.
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> ToolResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).await?.query(query);
        let response = self.send(request).await?;
        decode(response).await
    }

    /// `POST {base}{path}` with a JSON body and decode the JSON response.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ToolResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path).await?.json(body);
        let response = self.send(request).await?;
        decode(response).await
    }

    /// `PUT {base}{path}` for player commands; any 2xx is success and the body is ignored.
    pub async fn put_command<Q, B>(&self, path: &str, query: &Q, body: Option<&B>) -> ToolResult<()>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::PUT, path).await?.query(query);
        request = match body {
            Some(body) => request.json(body),
            // Spotify rejects bodiless PUTs without a length
            None => request.header(reqwest::header::CONTENT_LENGTH, 0),
        };
        self.send(request).await?;
        Ok(())
    }

    async fn request(&self, method: Method, path: &str) -> ToolResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        debug!("Spotify {} {}", method, path);
        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> ToolResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = provider_error(status, &body);
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        warn!("Spotify request failed: {}", err);
        Err(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ToolResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(PROVIDER, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ToolError::api(
            PROVIDER,
            None,
            format!("Unexpected response payload: {}", e),
        )
    })
}

/// Translate a non-2xx Spotify response into the tool error taxonomy.
fn provider_error(status: StatusCode, body: &str) -> ToolError {
    let (message, reason) = match serde_json::from_str::<SpotifyErrorBody>(body) {
        Ok(parsed) => (parsed.error.message, parsed.error.reason),
        Err(_) if body.trim().is_empty() => (
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            None,
        ),
        Err(_) => (body.trim().to_string(), None),
    };

    match status {
        StatusCode::UNAUTHORIZED => ToolError::auth(message),
        StatusCode::NOT_FOUND if reason.is_none() => ToolError::not_found(message),
        _ => ToolError::Api {
            provider: PROVIDER,
            status: Some(status.as_u16()),
            message,
            reason,
        },
    }
}
