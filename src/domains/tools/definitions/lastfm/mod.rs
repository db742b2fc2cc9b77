//! Last.fm similarity tools.

mod similar;

pub use similar::{
    GetSimilarArtistsParams, GetSimilarArtistsTool, GetSimilarTracksParams, GetSimilarTracksTool,
};
