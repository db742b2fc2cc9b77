//! Catalogue search tool.

use std::collections::HashMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::model::{Paging, SearchItem};
use crate::domains::tools::definitions::common::{check_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolResult};

const MAX_LIMIT: u32 = 50;
const MAX_OFFSET: u32 = 1000;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Kind of catalogue item to search for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Track,
    Artist,
    Album,
    Playlist,
    Show,
    Episode,
    Audiobook,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::Playlist => "playlist",
            Self::Show => "show",
            Self::Episode => "episode",
            Self::Audiobook => "audiobook",
        }
    }

    /// Key of the result container in the search response.
    fn container(&self) -> String {
        format!("{}s", self.as_str())
    }
}

/// Parameters for the search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchSpotifyParams {
    /// Search terms, e.g. "karma police" or "artist:radiohead".
    pub query: String,

    /// Type of item to search for (default: track).
    #[serde(default, alias = "type")]
    pub search_type: SearchType,

    /// Maximum number of results, 1-50 (default: 5). Raise it if the wanted item is missing.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Index of the first result, 0-1000 (default: 0).
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    5
}

// ============================================================================
// Output Structure
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: Option<String>,
    pub name: Option<String>,
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artists: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        Self {
            artists: item
                .artists
                .filter(|a| !a.is_empty())
                .map(|a| a.into_iter().filter_map(|r| r.name).collect()),
            album: item.album.and_then(|a| a.name),
            owner: item.owner.and_then(|o| o.display_name.or(o.id)),
            id: item.id,
            name: item.name,
            uri: item.uri,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchSpotifyResult {
    #[serde(rename = "type")]
    pub search_type: SearchType,
    pub items: Vec<SearchHit>,
    pub total: u32,
    pub offset: u32,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Search tool - finds tracks, artists, albums, playlists, shows, episodes or audiobooks.
pub struct SearchSpotifyTool;

#[async_trait]
impl ToolDefinition for SearchSpotifyTool {
    const NAME: &'static str = "search_spotify";
    const DESCRIPTION: &'static str = "Search Spotify for tracks, artists, albums, playlists, shows, episodes or audiobooks. \
        Each item carries its id and uri (needed for playback and playlists). \
        Use offset/next_offset to page through more results.";

    type Params = SearchSpotifyParams;
    type Output = SearchSpotifyResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        require_non_empty("query", &params.query)?;
        check_range("limit", params.limit, 1, MAX_LIMIT)?;
        check_range("offset", params.offset, 0, MAX_OFFSET)
    }

    #[instrument(skip_all, fields(query = %params.query, search_type = params.search_type.as_str()))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Search tool called");

        let query = [
            ("q", params.query.trim().to_string()),
            ("type", params.search_type.as_str().to_string()),
            ("limit", params.limit.to_string()),
            ("offset", params.offset.to_string()),
        ];
        let mut raw: HashMap<String, Paging<SearchItem>> =
            ctx.spotify().get("/search", &query).await?;

        let Some(page) = raw.remove(&params.search_type.container()) else {
            return Ok(SearchSpotifyResult {
                search_type: params.search_type,
                items: Vec::new(),
                total: 0,
                offset: params.offset,
                limit: params.limit,
                next_offset: None,
            });
        };

        let next_offset = page.next_offset(page.items.len());
        let items: Vec<SearchHit> = page.items.into_iter().flatten().map(SearchHit::from).collect();
        info!("Search returned {} of {} items", items.len(), page.total);

        Ok(SearchSpotifyResult {
            search_type: params.search_type,
            items,
            total: page.total,
            offset: params.offset,
            limit: params.limit,
            next_offset,
        })
    }
}
