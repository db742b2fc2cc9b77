//! Shared helpers for tool definitions: argument checks, identifier
//! normalization and list arguments.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domains::tools::{ToolError, ToolResult};

/// Parameters of tools that take no arguments.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

/// A list argument given either as a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Joined(String),
}

impl StringList {
    /// Trimmed, non-empty entries.
    pub fn entries(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Joined(joined) => joined.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Fail with a validation error unless `min <= value <= max`.
pub fn check_range(name: &str, value: u32, min: u32, max: u32) -> ToolResult<()> {
    if value < min || value > max {
        return Err(ToolError::validation(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

/// Fail with a validation error if `value` is empty or whitespace.
pub fn require_non_empty(name: &str, value: &str) -> ToolResult<()> {
    if value.trim().is_empty() {
        return Err(ToolError::validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Extract a bare Spotify id of the given kind.
///
/// Accepts a raw id, a `spotify:{kind}:{id}` URI or an
/// `https://open.spotify.com/{kind}/{id}` link. The result is safe to embed
/// in a request path.
pub fn spotify_id(kind: &str, value: &str) -> ToolResult<String> {
    let value = value.trim();
    let uri_prefix = format!("spotify:{}:", kind);
    let url_marker = format!("open.spotify.com/{}/", kind);

    let id = if let Some(rest) = value.strip_prefix(&uri_prefix) {
        rest
    } else if let Some(pos) = value.find(&url_marker) {
        let rest = &value[pos + url_marker.len()..];
        rest.split(['?', '#', '/']).next().unwrap_or_default()
    } else {
        value
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ToolError::validation(format!(
            "'{}' is not a valid Spotify {} id",
            value, kind
        )));
    }
    Ok(id.to_string())
}

/// Check that every entry looks like a Spotify URI (`spotify:{type}:{id}`).
pub fn check_uris(name: &str, uris: &[String]) -> ToolResult<()> {
    for uri in uris {
        let mut parts = uri.split(':');
        let valid = parts.next() == Some("spotify")
            && parts.next().is_some_and(|kind| !kind.is_empty())
            && parts.last().is_some_and(|id| !id.is_empty());
        if !valid {
            return Err(ToolError::validation(format!(
                "{} entry '{}' is not a Spotify URI",
                name, uri
            )));
        }
    }
    Ok(())
}
