//! Playlist tools: list, read, create and add tracks.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use super::TrackSummary;
use crate::api::model::{Paging, Playlist, PlaylistEntry, Snapshot, UserProfile};
use crate::domains::tools::definitions::common::{
    StringList, check_range, check_uris, require_non_empty, spotify_id,
};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolError, ToolResult};

const MAX_PLAYLISTS_LIMIT: u32 = 50;
const MAX_PLAYLISTS_OFFSET: u32 = 100_000;
const MAX_ITEMS_LIMIT: u32 = 100;
const MAX_ITEMS_OFFSET: u32 = 100_000;
const MAX_URIS_PER_ADD: usize = 100;

// ============================================================================
// List the user's playlists
// ============================================================================

/// Parameters for the playlists listing tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetCurrentUserPlaylistsParams {
    /// Playlists per page, 1-50 (default: 10).
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Index of the first playlist, 0-100000 (default: 0). Use next_offset to continue.
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

impl From<Playlist> for PlaylistSummary {
    fn from(playlist: Playlist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            uri: playlist.uri,
            description: playlist.description.filter(|d| !d.is_empty()),
            owner: playlist.owner.and_then(|o| o.display_name.or(o.id)),
            tracks_total: playlist.tracks.and_then(|t| t.total),
            public: playlist.public,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlaylistsResult {
    pub total: u32,
    pub returned: usize,
    pub limit: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
    pub playlists: Vec<PlaylistSummary>,
}

/// Playlists tool - one page of the playlists the user owns or follows.
pub struct GetCurrentUserPlaylistsTool;

#[async_trait]
impl ToolDefinition for GetCurrentUserPlaylistsTool {
    const NAME: &'static str = "get_current_user_playlists";
    const DESCRIPTION: &'static str = "List the playlists owned or followed by the current user, one page \
        at a time. When next_offset is present, call again with offset=next_offset to get more.";

    type Params = GetCurrentUserPlaylistsParams;
    type Output = PlaylistsResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        check_range("limit", params.limit, 1, MAX_PLAYLISTS_LIMIT)?;
        check_range("offset", params.offset, 0, MAX_PLAYLISTS_OFFSET)
    }

    #[instrument(skip_all, fields(limit = params.limit, offset = params.offset))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Playlists tool called");

        let query = [("limit", params.limit), ("offset", params.offset)];
        let page: Paging<Playlist> = ctx.spotify().get("/me/playlists", &query).await?;

        let next_offset = page.next_offset(page.items.len());
        let playlists: Vec<PlaylistSummary> = page
            .items
            .into_iter()
            .flatten()
            .map(PlaylistSummary::from)
            .collect();

        Ok(PlaylistsResult {
            total: page.total,
            returned: playlists.len(),
            limit: params.limit,
            offset: params.offset,
            next_offset,
            playlists,
        })
    }
}

// ============================================================================
// Read playlist items
// ============================================================================

/// Parameters for the playlist items tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPlaylistItemsParams {
    /// Playlist id, URI or open.spotify.com link.
    pub playlist_id: String,

    /// Items per page, 1-100 (default: 10).
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Index of the first item, 0-100000 (default: 0).
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct PlaylistItemsResult {
    pub playlist_id: String,
    pub total: u32,
    pub returned: usize,
    pub limit: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
    pub items: Vec<TrackSummary>,
}

/// Playlist items tool - one page of a playlist's tracks.
pub struct GetPlaylistItemsTool;

#[async_trait]
impl ToolDefinition for GetPlaylistItemsTool {
    const NAME: &'static str = "get_playlist_items";
    const DESCRIPTION: &'static str = "Get the tracks of a playlist, one page at a time. For the user's own \
        playlists call get_current_user_playlists first to find the id. Unavailable entries are skipped.";

    type Params = GetPlaylistItemsParams;
    type Output = PlaylistItemsResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        spotify_id("playlist", &params.playlist_id)?;
        check_range("limit", params.limit, 1, MAX_ITEMS_LIMIT)?;
        check_range("offset", params.offset, 0, MAX_ITEMS_OFFSET)
    }

    #[instrument(skip_all, fields(playlist_id = %params.playlist_id))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Playlist items tool called");
        let playlist_id = spotify_id("playlist", &params.playlist_id)?;

        let query = [("limit", params.limit), ("offset", params.offset)];
        let page: Paging<PlaylistEntry> = ctx
            .spotify()
            .get(&format!("/playlists/{}/tracks", playlist_id), &query)
            .await?;

        let next_offset = page.next_offset(page.items.len());
        let items: Vec<TrackSummary> = page
            .items
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.track)
            .map(TrackSummary::from)
            .collect();

        Ok(PlaylistItemsResult {
            playlist_id,
            total: page.total,
            returned: items.len(),
            limit: params.limit,
            offset: params.offset,
            next_offset,
            items,
        })
    }
}

// ============================================================================
// Create a playlist
// ============================================================================

/// Parameters for the playlist creation tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreatePlaylistParams {
    /// Name of the new playlist.
    pub name: String,

    /// Playlist description (default: empty).
    #[serde(default)]
    pub description: String,

    /// Whether the playlist is public (default: true).
    #[serde(default = "default_public")]
    pub public: bool,

    /// Owner user id. Defaults to the current user.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
}

/// User ids are not restricted to base62, but they must stay a single path segment.
fn user_path_segment(user_id: &str) -> ToolResult<String> {
    let user_id = user_id.trim();
    let user_id = user_id.strip_prefix("spotify:user:").unwrap_or(user_id);
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(ToolError::validation(format!(
            "'{}' is not a valid Spotify user id",
            user_id
        )));
    }
    Ok(user_id.to_string())
}

/// Playlist creation tool.
pub struct CreatePlaylistTool;

#[async_trait]
impl ToolDefinition for CreatePlaylistTool {
    const NAME: &'static str = "create_playlist";
    const DESCRIPTION: &'static str = "Create a new playlist for the current user (or for user_id when \
        given). Returns the new playlist's id and uri for use with add_to_playlist.";

    type Params = CreatePlaylistParams;
    type Output = CreatedPlaylist;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        require_non_empty("name", &params.name)?;
        if let Some(user_id) = &params.user_id {
            user_path_segment(user_id)?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(name = %params.name))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Create playlist tool called");

        let user_id = match &params.user_id {
            Some(user_id) => user_path_segment(user_id)?,
            None => {
                let me: UserProfile = ctx.spotify().get("/me", &[] as &[(&str, &str)]).await?;
                user_path_segment(&me.id)?
            }
        };

        let body = json!({
            "name": params.name.trim(),
            "description": params.description,
            "public": params.public,
        });
        let playlist: Playlist = ctx
            .spotify()
            .post(&format!("/users/{}/playlists", user_id), &body)
            .await?;
        info!("Created playlist {}", playlist.id);

        Ok(CreatedPlaylist {
            id: playlist.id,
            name: playlist.name,
            uri: playlist.uri,
            url: playlist.external_urls.spotify,
            public: playlist.public,
        })
    }
}

// ============================================================================
// Add tracks to a playlist
// ============================================================================

/// Parameters for the add-to-playlist tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddToPlaylistParams {
    /// Playlist id, URI or open.spotify.com link.
    pub playlist_id: String,

    /// Track or episode URIs to add (1-100), as an array or a comma-separated string.
    #[serde(alias = "track_uri")]
    pub track_uris: StringList,
}

#[derive(Debug, Serialize)]
pub struct AddToPlaylistResult {
    pub playlist_id: String,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

/// Add-to-playlist tool - appends tracks in a single request.
pub struct AddToPlaylistTool;

#[async_trait]
impl ToolDefinition for AddToPlaylistTool {
    const NAME: &'static str = "add_to_playlist";
    const DESCRIPTION: &'static str = "Add tracks (or episodes) to a playlist by URI. Batch as many URIs \
        as possible (up to 100) into one call.";

    type Params = AddToPlaylistParams;
    type Output = AddToPlaylistResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        spotify_id("playlist", &params.playlist_id)?;
        let uris = params.track_uris.entries();
        if uris.is_empty() || uris.len() > MAX_URIS_PER_ADD {
            return Err(ToolError::validation(format!(
                "track_uris must contain between 1 and {} URIs, got {}",
                MAX_URIS_PER_ADD,
                uris.len()
            )));
        }
        check_uris("track_uris", &uris)
    }

    #[instrument(skip_all, fields(playlist_id = %params.playlist_id))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        let playlist_id = spotify_id("playlist", &params.playlist_id)?;
        let uris = params.track_uris.entries();
        info!("Adding {} track(s) to playlist", uris.len());

        let snapshot: Snapshot = ctx
            .spotify()
            .post(
                &format!("/playlists/{}/tracks", playlist_id),
                &json!({ "uris": uris }),
            )
            .await?;

        Ok(AddToPlaylistResult {
            playlist_id,
            added: uris.len(),
            snapshot_id: snapshot.snapshot_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockProviders;

    fn parse<P: serde::de::DeserializeOwned>(value: serde_json::Value) -> P {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_playlists_pagination() {
        let mock = MockProviders::start().await;
        let ctx = mock.context();

        let first = GetCurrentUserPlaylistsTool::execute(&ctx, parse(json!({ "limit": 2 })))
            .await
            .unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.returned, 2);
        assert_eq!(first.next_offset, Some(2));
        assert_eq!(first.playlists[0].owner.as_deref(), Some("Test User"));
        assert_eq!(first.playlists[0].tracks_total, Some(12));
        assert!(first.playlists[1].description.is_none());

        let second = GetCurrentUserPlaylistsTool::execute(
            &ctx,
            parse(json!({ "limit": 2, "offset": first.next_offset })),
        )
        .await
        .unwrap();
        assert_eq!(second.returned, 1);
        assert_eq!(second.next_offset, None);
    }

    #[test]
    fn test_playlists_offset_bound() {
        let params: GetCurrentUserPlaylistsParams = parse(json!({ "offset": 100_001 }));
        assert!(GetCurrentUserPlaylistsTool::validate(&params).is_err());

        let items: GetPlaylistItemsParams =
            parse(json!({ "playlist_id": "mixed", "offset": u32::MAX }));
        let err = GetPlaylistItemsTool::validate(&items).unwrap_err();
        assert!(err.to_string().contains("offset"));
    }

    #[tokio::test]
    async fn test_playlist_items_skip_missing_tracks() {
        let mock = MockProviders::start().await;
        let result = GetPlaylistItemsTool::execute(
            &mock.context(),
            parse(json!({ "playlist_id": "spotify:playlist:mixed", "limit": 3 })),
        )
        .await
        .unwrap();

        assert_eq!(result.playlist_id, "mixed");
        assert_eq!(result.total, 5);
        assert_eq!(result.returned, 2);
        assert_eq!(result.items[1].explicit, Some(true));
        assert_eq!(result.next_offset, Some(3));
    }

    #[test]
    fn test_add_requires_uris() {
        let params: AddToPlaylistParams = parse(json!({ "playlist_id": "abc", "track_uris": " , " }));
        assert_eq!(
            AddToPlaylistTool::validate(&params).unwrap_err().kind(),
            "validation_error"
        );

        let too_many: Vec<String> = (0..101).map(|i| format!("spotify:track:t{i}")).collect();
        let params: AddToPlaylistParams = parse(json!({ "playlist_id": "abc", "track_uris": too_many }));
        assert!(AddToPlaylistTool::validate(&params).is_err());
    }

    #[tokio::test]
    async fn test_malformed_uri_rejected_before_any_call() {
        let mock = MockProviders::start().await;
        let registry = crate::domains::tools::ToolRegistry::new(mock.context());
        let args = json!({
            "playlist_id": "chill",
            "track_uris": "spotify:track:track1, https://example.com/song"
        });

        let err = registry
            .dispatch(AddToPlaylistTool::NAME, args.as_object().cloned().unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("https://example.com/song"));
        assert_eq!(mock.state.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_then_add_then_read() {
        let mock = MockProviders::start().await;
        let ctx = mock.context();

        let created = CreatePlaylistTool::execute(
            &ctx,
            parse(json!({ "name": "Road Trip", "description": "songs for the drive" })),
        )
        .await
        .unwrap();
        assert_eq!(created.name, "Road Trip");
        assert_eq!(created.public, Some(true));
        assert_eq!(mock.state.created_playlists(), vec![("test-user".to_string(), "Road Trip".to_string())]);

        let added = AddToPlaylistTool::execute(
            &ctx,
            parse(json!({
                "playlist_id": created.id,
                "track_uris": "spotify:track:track1, spotify:track:track2"
            })),
        )
        .await
        .unwrap();
        assert_eq!(added.added, 2);
        assert!(added.snapshot_id.is_some());

        let items = GetPlaylistItemsTool::execute(&ctx, parse(json!({ "playlist_id": created.uri })))
            .await
            .unwrap();
        let uris: Vec<&str> = items.items.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, vec!["spotify:track:track1", "spotify:track:track2"]);
    }

    #[tokio::test]
    async fn test_create_for_explicit_user_skips_profile_lookup() {
        let mock = MockProviders::start().await;
        CreatePlaylistTool::execute(
            &mock.context(),
            parse(json!({ "name": "Mine", "user_id": "other.user", "public": false })),
        )
        .await
        .unwrap();

        assert_eq!(mock.state.created_playlists(), vec![("other.user".to_string(), "Mine".to_string())]);
        assert_eq!(mock.state.me_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_to_unowned_playlist_is_api_error() {
        let mock = MockProviders::start().await;
        let err = AddToPlaylistTool::execute(
            &mock.context(),
            parse(json!({ "playlist_id": "notmine", "track_uris": ["spotify:track:track1"] })),
        )
        .await
        .unwrap_err();

        match err {
            ToolError::Api { status, message, .. } => {
                assert_eq!(status, Some(403));
                assert_eq!(message, "You cannot add tracks to a playlist you don't own.");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
