//! Tool definitions, grouped by provider.
//!
//! - `spotify/` - catalogue search, user data, playlists and playback
//! - `lastfm/` - similar tracks and artists
//! - `common` - argument checks shared by both

pub mod common;
pub mod lastfm;
pub mod spotify;

pub use lastfm::{GetSimilarArtistsTool, GetSimilarTracksTool};
pub use spotify::{
    AddToPlaylistTool, ArtistTopTracksTool, CreatePlaylistTool, CurrentUserProfileTool,
    CurrentUserTopTracksTool, GetCurrentUserPlaylistsTool, GetPlaylistItemsTool,
    PausePlaybackTool, SearchSpotifyTool, StartPlaybackTool,
};
