//! Artist top tracks tool.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::TrackSummary;
use crate::api::model::TopTracks;
use crate::domains::tools::definitions::common::{require_non_empty, spotify_id};
use crate::domains::tools::{ToolContext, ToolDefinition, ToolResult};

/// Parameters for the artist top tracks tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ArtistTopTracksParams {
    /// Spotify artist id (e.g. "4Z8W4fKeB5YxbusRsdQVPb") or artist URI.
    pub artist_id: String,

    /// ISO 3166-1 alpha-2 market code (default: "US").
    #[serde(default = "default_market")]
    pub market: String,
}

fn default_market() -> String {
    "US".to_string()
}

#[derive(Debug, Serialize)]
pub struct ArtistTopTracksResult {
    pub artist_id: String,
    pub tracks: Vec<TrackSummary>,
}

/// Artist top tracks tool - the artist's most popular tracks in a market.
pub struct ArtistTopTracksTool;

#[async_trait]
impl ToolDefinition for ArtistTopTracksTool {
    const NAME: &'static str = "artist_top_tracks";
    const DESCRIPTION: &'static str = "Get an artist's top tracks. Requires the Spotify artist id; \
        use search_spotify with search_type=artist to find it.";

    type Params = ArtistTopTracksParams;
    type Output = ArtistTopTracksResult;

    fn validate(params: &Self::Params) -> ToolResult<()> {
        spotify_id("artist", &params.artist_id)?;
        require_non_empty("market", &params.market)
    }

    #[instrument(skip_all, fields(artist_id = %params.artist_id))]
    async fn execute(ctx: &ToolContext, params: Self::Params) -> ToolResult<Self::Output> {
        info!("Artist top tracks tool called");
        let artist_id = spotify_id("artist", &params.artist_id)?;

        let raw: TopTracks = ctx
            .spotify()
            .get(
                &format!("/artists/{}/top-tracks", artist_id),
                &[("market", params.market.trim())],
            )
            .await?;

        Ok(ArtistTopTracksResult {
            artist_id,
            tracks: raw.tracks.into_iter().map(TrackSummary::from).collect(),
        })
    }
}
