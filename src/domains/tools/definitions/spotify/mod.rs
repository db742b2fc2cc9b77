//! Spotify Web API tools.

mod artist;
mod playback;
mod playlist;
mod search;
mod user;

use serde::Serialize;

use crate::api::model::Track;

pub use artist::{ArtistTopTracksParams, ArtistTopTracksTool};
pub use playback::{PausePlaybackParams, PausePlaybackTool, StartPlaybackParams, StartPlaybackTool};
pub use playlist::{
    AddToPlaylistParams, AddToPlaylistTool, CreatePlaylistParams, CreatePlaylistTool,
    GetCurrentUserPlaylistsParams, GetCurrentUserPlaylistsTool, GetPlaylistItemsParams,
    GetPlaylistItemsTool,
};
pub use search::{SearchSpotifyParams, SearchSpotifyTool, SearchType};
pub use user::{CurrentUserProfileTool, CurrentUserTopTracksParams, CurrentUserTopTracksTool, TimeRange};

/// Compact track record shared by the track-listing tools.
#[derive(Debug, Serialize)]
pub struct TrackSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,
}

impl From<Track> for TrackSummary {
    fn from(track: Track) -> Self {
        Self {
            rank: None,
            artists: track.artist_names(),
            album: track.album_name(),
            id: track.id,
            name: track.name,
            uri: track.uri,
            popularity: track.popularity,
            explicit: track.explicit,
        }
    }
}
