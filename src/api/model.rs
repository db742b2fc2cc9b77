//! Provider payload shapes.
//!
//! Only the fields the tools reshape are modelled; everything else in the
//! provider responses is ignored. Most fields are optional because Spotify
//! omits or nulls them depending on the object type and market.

use serde::{Deserialize, Deserializer};

// ============================================================================
// Spotify
// ============================================================================

/// Spotify error body: `{"error": {"status": 404, "message": "...", "reason": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct SpotifyErrorBody {
    pub error: SpotifyErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct SpotifyErrorDetail {
    #[serde(default)]
    pub status: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Any object carrying a display name.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<NamedRef>,
    #[serde(default)]
    pub album: Option<NamedRef>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub explicit: Option<bool>,
}

impl Track {
    pub fn artist_names(&self) -> Vec<String> {
        names(&self.artists)
    }

    pub fn album_name(&self) -> Option<String> {
        self.album.as_ref().and_then(|a| a.name.clone())
    }
}

/// A search hit of any type (track, artist, album, playlist, show, episode, audiobook).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artists: Option<Vec<NamedRef>>,
    #[serde(default)]
    pub album: Option<NamedRef>,
    #[serde(default)]
    pub owner: Option<Owner>,
}

/// Standard Spotify paging object.
///
/// Search results for some types contain `null` entries, hence `Option<T>`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<Option<T>>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Paging<T> {
    /// Offset of the next page, if the provider reports one.
    pub fn next_offset(&self, returned: usize) -> Option<u32> {
        self.next.as_ref().map(|_| {
            self.offset
                .saturating_add(u32::try_from(returned).unwrap_or(u32::MAX))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TopTracks {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub followers: Option<Followers>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackCount {
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(default)]
    pub tracks: Option<TrackCount>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Entry of a playlist; `track` is null for unavailable items.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

fn names(refs: &[NamedRef]) -> Vec<String> {
    refs.iter().filter_map(|r| r.name.clone()).collect()
}

// ============================================================================
// Last.fm
// ============================================================================

/// Last.fm error body: `{"error": 6, "message": "Track not found"}`.
#[derive(Debug, Deserialize)]
pub struct LastfmErrorBody {
    pub error: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarTracksResponse {
    pub similartracks: SimilarTracks,
}

#[derive(Debug, Deserialize)]
pub struct SimilarTracks {
    #[serde(default, deserialize_with = "one_or_many")]
    pub track: Vec<SimilarTrack>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarTrack {
    pub name: String,
    pub artist: LastfmArtistRef,
    #[serde(rename = "match", default, deserialize_with = "score")]
    pub score: f64,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastfmArtistRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarArtistsResponse {
    pub similarartists: SimilarArtists,
}

#[derive(Debug, Deserialize)]
pub struct SimilarArtists {
    #[serde(default, deserialize_with = "one_or_many")]
    pub artist: Vec<SimilarArtist>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarArtist {
    pub name: String,
    #[serde(rename = "match", default, deserialize_with = "score")]
    pub score: f64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Last.fm sends `match` as a number for tracks and as a string for artists.
fn score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    match Score::deserialize(deserializer)? {
        Score::Number(n) => Ok(n),
        Score::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Last.fm collapses single-element lists into a bare object.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::<T>::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}
