//! Similar tracks and similar artists, from Last.fm.
//!
//! Results are ordered by descending similarity score. Last.fm usually sends
//! them sorted already, but that is not documented.

use std::cmp::Ordering;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::api::model::{SimilarArtistsResponse, SimilarTracksResponse};
use crate::domains::tools::definitions::common::{check_range, require_non_empty};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolResult};

const MAX_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    5
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// ============================================================================
// Similar tracks
// ============================================================================

/// Parameters for the similar tracks tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSimilarTracksParams {
    /// Artist of the seed track.
    #[serde(alias = "artist_name")]
    pub artist: String,

    /// Title of the seed track.
    #[serde(alias = "track_name")]
    pub track: String,

    /// Maximum number of similar tracks, 1-100 (default: 5).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct SimilarTrackEntry {
    pub track: String,
    pub artist: String,
    #[serde(rename = "match")]
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimilarTracksResult {
    pub artist: String,
    pub track: String,
    pub similar_tracks: Vec<SimilarTrackEntry>,
}

/// Similar tracks tool.
pub struct GetSimilarTracksTool;

#[async_trait]
impl ToolDefinition for GetSimilarTracksTool {
    const NAME: &'static str = "get_similar_tracks";
    const DESCRIPTION: &'static str = "Find tracks similar to a given song, using Last.fm listening data. \
        Results are ordered from most to least similar. Search Spotify for a result to get its uri.";

    type Params = GetSimilarTracksParams;
    type Output = SimilarTracksResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        require_non_empty("artist", &params.artist)?;
        require_non_empty("track", &params.track)?;
        check_range("limit", params.limit, 1, MAX_LIMIT)
    }

    #[instrument(skip_all, fields(artist = %params.artist, track = %params.track))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Similar tracks tool called");

        let raw: SimilarTracksResponse = ctx
            .lastfm()
            .call(
                "track.getSimilar",
                &[
                    ("artist", params.artist.trim().to_string()),
                    ("track", params.track.trim().to_string()),
                    ("limit", params.limit.to_string()),
                ],
            )
            .await?;

        let mut similar_tracks: Vec<SimilarTrackEntry> = raw
            .similartracks
            .track
            .into_iter()
            .map(|t| SimilarTrackEntry {
                track: t.name,
                artist: t.artist.name,
                score: t.score,
                url: t.url,
            })
            .collect();
        similar_tracks.sort_by(|a, b| by_score_desc(a.score, b.score));
        similar_tracks.truncate(params.limit as usize);

        Ok(SimilarTracksResult {
            artist: params.artist,
            track: params.track,
            similar_tracks,
        })
    }
}

// ============================================================================
// Similar artists
// ============================================================================

/// Parameters for the similar artists tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSimilarArtistsParams {
    /// Seed artist name.
    #[serde(alias = "artist_name")]
    pub artist: String,

    /// Maximum number of similar artists, 1-100 (default: 5).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct SimilarArtistEntry {
    pub name: String,
    #[serde(rename = "match")]
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimilarArtistsResult {
    pub artist: String,
    pub similar_artists: Vec<SimilarArtistEntry>,
}

/// Similar artists tool.
pub struct GetSimilarArtistsTool;

#[async_trait]
impl ToolDefinition for GetSimilarArtistsTool {
    const NAME: &'static str = "get_similar_artists";
    const DESCRIPTION: &'static str = "Find artists similar to a given artist, using Last.fm listening data. \
        Results are ordered from most to least similar.";

    type Params = GetSimilarArtistsParams;
    type Output = SimilarArtistsResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        require_non_empty("artist", &params.artist)?;
        check_range("limit", params.limit, 1, MAX_LIMIT)
    }

    #[instrument(skip_all, fields(artist = %params.artist))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Similar artists tool called");

        let raw: SimilarArtistsResponse = ctx
            .lastfm()
            .call(
                "artist.getSimilar",
                &[
                    ("artist", params.artist.trim().to_string()),
                    ("limit", params.limit.to_string()),
                ],
            )
            .await?;

        let mut similar_artists: Vec<SimilarArtistEntry> = raw
            .similarartists
            .artist
            .into_iter()
            .map(|a| SimilarArtistEntry {
                name: a.name,
                score: a.score,
                url: a.url,
            })
            .collect();
        similar_artists.sort_by(|a, b| by_score_desc(a.score, b.score));
        similar_artists.truncate(params.limit as usize);

        Ok(SimilarArtistsResult {
            artist: params.artist,
            similar_artists,
        })
    }
}
