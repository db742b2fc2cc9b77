//! Outbound API clients.
//!
//! Every tool call ends up here: the Spotify Web API (behind a cached OAuth
//! access token) and the Last.fm API (API key only). All requests share one
//! `reqwest` client configured with an explicit timeout.

mod http;
pub mod lastfm;
pub mod model;
pub mod spotify;
pub mod token;

pub use http::build_http_client;
pub use lastfm::LastfmClient;
pub use spotify::SpotifyClient;
pub use token::TokenManager;
