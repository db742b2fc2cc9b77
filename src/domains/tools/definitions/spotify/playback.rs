//! Playback control tools. Both act on the user's active device unless a
//! device id is given, and need a Premium account.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::domains::tools::definitions::common::{StringList, check_uris, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolResult};

const MAX_PLAY_URIS: usize = 100;

#[derive(Debug, Serialize)]
pub struct PlaybackResult {
    pub status: &'static str,
}

impl PlaybackResult {
    fn ok() -> Self {
        Self { status: "ok" }
    }
}

fn device_query(device_id: &Option<String>) -> Vec<(&'static str, String)> {
    device_id
        .iter()
        .map(|id| ("device_id", id.trim().to_string()))
        .collect()
}

// ============================================================================
// Start / resume
// ============================================================================

/// Parameters for the start playback tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StartPlaybackParams {
    /// Device to play on (default: the active device).
    #[serde(default)]
    pub device_id: Option<String>,

    /// Album, artist or playlist URI to play.
    #[serde(default)]
    pub context_uri: Option<String>,

    /// Track URIs to play, as an array or a comma-separated string.
    #[serde(default)]
    pub track_uris: Option<StringList>,

    /// Position in the first track to start from, in milliseconds.
    #[serde(default)]
    pub position_ms: Option<u64>,
}

/// Start playback tool - plays a context or a list of tracks, or resumes.
pub struct StartPlaybackTool;

#[async_trait]
impl ToolDefinition for StartPlaybackTool {
    const NAME: &'static str = "start_playback";
    const DESCRIPTION: &'static str = "Start or resume playback on the user's active device. Give either \
        context_uri (album/artist/playlist) or track_uris, not both; with neither, playback resumes.";

    type Params = StartPlaybackParams;
    type Output = PlaybackResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        if let Some(device_id) = &params.device_id {
            require_non_empty("device_id", device_id)?;
        }
        if let Some(context_uri) = &params.context_uri {
            check_uris("context_uri", std::slice::from_ref(&context_uri.trim().to_string()))?;
        }
        if let Some(track_uris) = &params.track_uris {
            let uris = track_uris.entries();
            if uris.is_empty() || uris.len() > MAX_PLAY_URIS {
                return Err(ToolError::validation(format!(
                    "track_uris must contain between 1 and {} URIs",
                    MAX_PLAY_URIS
                )));
            }
            check_uris("track_uris", &uris)?;
        }
        if params.context_uri.is_some() && params.track_uris.is_some() {
            return Err(ToolError::validation(
                "context_uri and track_uris are mutually exclusive",
            ));
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Start playback tool called");

        let mut body = Map::new();
        if let Some(context_uri) = &params.context_uri {
            body.insert("context_uri".into(), Value::from(context_uri.trim()));
        }
        if let Some(track_uris) = &params.track_uris {
            body.insert("uris".into(), Value::from(track_uris.entries()));
        }
        if let Some(position_ms) = params.position_ms {
            body.insert("position_ms".into(), Value::from(position_ms));
        }

        let query = device_query(&params.device_id);
        let body = (!body.is_empty()).then_some(body);
        ctx.spotify()
            .put_command("/me/player/play", &query, body.as_ref())
            .await?;

        Ok(PlaybackResult::ok())
    }
}

// ============================================================================
// Pause
// ============================================================================

/// Parameters for the pause tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct PausePlaybackParams {
    /// Device to pause (default: the active device).
    #[serde(default)]
    pub device_id: Option<String>,
}

/// Pause tool.
pub struct PausePlaybackTool;

#[async_trait]
impl ToolDefinition for PausePlaybackTool {
    const NAME: &'static str = "pause_playback";
    const DESCRIPTION: &'static str = "Pause playback on the user's active device.";

    type Params = PausePlaybackParams;
    type Output = PlaybackResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        match &params.device_id {
            Some(device_id) => require_non_empty("device_id", device_id),
            None => Ok(()),
        }
    }

    #[instrument(skip_all)]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Pause playback tool called");
        ctx.spotify()
            .put_command("/me/player/pause", &device_query(&params.device_id), None::<&Value>)
            .await?;
        Ok(PlaybackResult::ok())
    }
}
