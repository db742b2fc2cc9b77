//! In-process stand-ins for the Spotify accounts service, the Spotify Web API
//! and Last.fm, served by axum on an ephemeral port.
//!
//! Every route counts its hits so tests can assert that a call never reached
//! the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{LastfmClient, SpotifyClient, TokenManager, build_http_client};
use crate::domains::tools::ToolContext;

pub const LASTFM_KEY: &str = "test-lastfm-key";
const ACTIVE_DEVICE: &str = "device-1";

type QueryMap = Query<HashMap<String, String>>;

/// Counters and recorded requests of the mock providers.
pub struct MockState {
    pub token_calls: AtomicUsize,
    pub spotify_calls: AtomicUsize,
    pub lastfm_calls: AtomicUsize,
    pub token_lifetime_secs: AtomicU64,
    pub refresh_tokens_seen: Mutex<Vec<String>>,
    me_calls: AtomicUsize,
    me_delay_ms: AtomicU64,
    revoke_next: AtomicBool,
    last_query: Mutex<HashMap<String, String>>,
    last_play_body: Mutex<Option<Value>>,
    created: Mutex<Vec<(String, String)>>,
    playlist_tracks: Mutex<HashMap<String, Vec<String>>>,
}

impl MockState {
    fn new() -> Self {
        Self {
            token_calls: AtomicUsize::new(0),
            spotify_calls: AtomicUsize::new(0),
            lastfm_calls: AtomicUsize::new(0),
            token_lifetime_secs: AtomicU64::new(3600),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            me_calls: AtomicUsize::new(0),
            me_delay_ms: AtomicU64::new(0),
            revoke_next: AtomicBool::new(false),
            last_query: Mutex::new(HashMap::new()),
            last_play_body: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            playlist_tracks: Mutex::new(HashMap::new()),
        }
    }

    /// Requests received by any provider.
    pub fn total_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
            + self.spotify_calls.load(Ordering::SeqCst)
            + self.lastfm_calls.load(Ordering::SeqCst)
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn set_me_delay(&self, delay: Duration) {
        self.me_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Answer the next Web API request with 401 regardless of its token.
    pub fn revoke_next_request(&self) {
        self.revoke_next.store(true, Ordering::SeqCst);
    }

    /// Query string of the most recent Spotify or Last.fm request.
    pub fn last_query(&self) -> HashMap<String, String> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn last_play_body(&self) -> Option<Value> {
        self.last_play_body.lock().unwrap().clone()
    }

    /// `(owner, name)` of every playlist created so far.
    pub fn created_playlists(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, query: &HashMap<String, String>) {
        *self.last_query.lock().unwrap() = query.clone();
    }
}

/// Running mock server; stopped on drop.
pub struct MockProviders {
    pub state: Arc<MockState>,
    base_url: String,
    server: JoinHandle<()>,
}

impl MockProviders {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{}", addr),
            server,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base_url)
    }

    pub fn spotify_url(&self) -> String {
        format!("{}/v1", self.base_url)
    }

    pub fn lastfm_url(&self) -> String {
        format!("{}/lastfm/2.0/", self.base_url)
    }

    /// Tool context wired to this mock with valid credentials.
    pub fn context(&self) -> ToolContext {
        self.context_with_timeout(Duration::from_secs(5))
    }

    pub fn context_with_timeout(&self, timeout: Duration) -> ToolContext {
        let http = build_http_client(timeout).unwrap();
        let tokens = TokenManager::new(
            http.clone(),
            self.token_url(),
            "test-client",
            "test-secret",
            "test-refresh",
            Duration::from_secs(60),
        );
        ToolContext::new(
            SpotifyClient::new(http.clone(), self.spotify_url(), tokens),
            LastfmClient::new(http, self.lastfm_url(), LASTFM_KEY),
        )
    }
}

impl Drop for MockProviders {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/artists/{id}/top-tracks", get(artist_top_tracks))
        .route("/v1/me", get(me))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/me/playlists", get(my_playlists))
        .route("/v1/users/{user_id}/playlists", post(create_playlist))
        .route(
            "/v1/playlists/{id}/tracks",
            get(playlist_items).post(add_tracks),
        )
        .route("/v1/me/player/play", put(player_command))
        .route("/v1/me/player/pause", put(player_command))
        .route("/lastfm/2.0/", get(lastfm))
        .with_state(state)
}

// ============================================================================
// Fixtures
// ============================================================================

fn track(id: &str, name: &str, album: &str, popularity: u32, explicit: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{}", id),
        "artists": [{ "id": "artist1", "name": "Radiohead" }],
        "album": { "id": "album1", "name": album },
        "popularity": popularity,
        "explicit": explicit
    })
}

fn catalogue() -> Vec<Value> {
    vec![
        track("track1", "Karma Police", "OK Computer", 85, false),
        track("track2", "Creep", "Pablo Honey", 90, true),
        track("track3", "No Surprises", "OK Computer", 80, false),
    ]
}

fn top_list() -> Vec<Value> {
    let tracks = catalogue();
    vec![tracks[1].clone(), tracks[0].clone(), tracks[2].clone()]
}

fn page(all: &[Value], query: &HashMap<String, String>, total: Option<usize>) -> Value {
    let limit: usize = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let offset: usize = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let total = total.unwrap_or(all.len());
    let items: Vec<Value> = all.iter().skip(offset).take(limit).cloned().collect();
    let next = if offset + items.len() < total {
        json!(format!("https://api.spotify.com/v1/next?offset={}", offset + items.len()))
    } else {
        Value::Null
    };
    json!({ "items": items, "total": total, "offset": offset, "limit": limit, "next": next })
}

fn spotify_error(status: StatusCode, message: &str, reason: Option<&str>) -> Response {
    let mut error = json!({ "status": status.as_u16(), "message": message });
    if let Some(reason) = reason {
        error["reason"] = json!(reason);
    }
    (status, Json(json!({ "error": error }))).into_response()
}

/// Count the call and check the bearer token issued by `/api/token`.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    state.spotify_calls.fetch_add(1, Ordering::SeqCst);
    let valid = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer token-"));
    if valid && !state.revoke_next.swap(false, Ordering::SeqCst) {
        Ok(())
    } else {
        Err(spotify_error(
            StatusCode::UNAUTHORIZED,
            "Invalid access token",
            None,
        ))
    }
}

// ============================================================================
// Accounts service
// ============================================================================

async fn token(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let n = state.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let refresh = form.get("refresh_token").cloned().unwrap_or_default();
    state.refresh_tokens_seen.lock().unwrap().push(refresh.clone());

    if form.get("grant_type").map(String::as_str) != Some("refresh_token") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response();
    }
    if refresh == "revoked-refresh" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Refresh token revoked" })),
        )
            .into_response();
    }

    let mut body = json!({
        "access_token": format!("token-{}", n),
        "token_type": "Bearer",
        "expires_in": state.token_lifetime_secs.load(Ordering::SeqCst),
        "scope": "user-read-private playlist-modify-public user-modify-playback-state"
    });
    if refresh.starts_with("rotat") {
        body["refresh_token"] = json!(format!("rotated-{}", n));
    }
    Json(body).into_response()
}

// ============================================================================
// Web API
// ============================================================================

async fn search(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);

    match query.get("type").map(String::as_str) {
        Some("track") => Json(json!({ "tracks": page(&catalogue(), &query, Some(42)) })).into_response(),
        Some("artist") => {
            let artists = vec![json!({
                "id": "artist1",
                "name": "Radiohead",
                "uri": "spotify:artist:artist1"
            })];
            Json(json!({ "artists": page(&artists, &query, None) })).into_response()
        }
        _ => Json(json!({})).into_response(),
    }
}

async fn artist_top_tracks(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): QueryMap,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);

    if id != "artist1" {
        return spotify_error(StatusCode::NOT_FOUND, "Resource not found", None);
    }
    Json(json!({ "tracks": top_list() })).into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.me_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.me_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    Json(json!({
        "id": "test-user",
        "display_name": "Test User",
        "email": "test@example.com",
        "country": "US",
        "product": "premium",
        "followers": { "href": null, "total": 7 },
        "uri": "spotify:user:test-user"
    }))
    .into_response()
}

async fn top_tracks(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);
    Json(page(&top_list(), &query, None)).into_response()
}

async fn my_playlists(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): QueryMap,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);

    let playlist = |id: &str, name: &str, description: &str, total: u32| {
        json!({
            "id": id,
            "name": name,
            "uri": format!("spotify:playlist:{}", id),
            "description": description,
            "owner": { "id": "test-user", "display_name": "Test User" },
            "tracks": { "href": "", "total": total },
            "public": true,
            "external_urls": { "spotify": format!("https://open.spotify.com/playlist/{}", id) }
        })
    };
    let all = vec![
        playlist("chill", "Chill", "Slow evenings", 12),
        playlist("gym", "Gym", "", 30),
        playlist("mixed", "Mixed", "Odds and ends", 5),
    ];
    Json(page(&all, &query, None)).into_response()
}

async fn create_playlist(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    let name = body["name"].as_str().unwrap_or_default().to_string();
    let id = {
        let mut created = state.created.lock().unwrap();
        created.push((user_id.clone(), name.clone()));
        format!("created{}", created.len())
    };
    state
        .playlist_tracks
        .lock()
        .unwrap()
        .insert(id.clone(), Vec::new());

    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "name": name,
            "uri": format!("spotify:playlist:{}", id),
            "description": body["description"],
            "public": body["public"],
            "owner": { "id": user_id },
            "tracks": { "total": 0 },
            "external_urls": { "spotify": format!("https://open.spotify.com/playlist/{}", id) }
        })),
    )
        .into_response()
}

async fn playlist_items(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): QueryMap,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);

    if id == "mixed" {
        let tracks = catalogue();
        let entries = vec![
            json!({ "track": tracks[0] }),
            json!({ "track": null }),
            json!({ "track": tracks[1] }),
            json!({ "track": tracks[2] }),
            json!({ "track": tracks[0] }),
        ];
        return Json(page(&entries, &query, None)).into_response();
    }

    let Some(uris) = state.playlist_tracks.lock().unwrap().get(&id).cloned() else {
        return spotify_error(StatusCode::NOT_FOUND, "Resource not found", None);
    };
    let entries: Vec<Value> = uris
        .iter()
        .map(|uri| {
            let id = uri.rsplit(':').next().unwrap_or_default();
            json!({ "track": { "id": id, "name": id, "uri": uri, "artists": [] } })
        })
        .collect();
    Json(page(&entries, &query, None)).into_response()
}

async fn add_tracks(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }

    if id == "notmine" {
        return spotify_error(
            StatusCode::FORBIDDEN,
            "You cannot add tracks to a playlist you don't own.",
            None,
        );
    }

    let uris: Vec<String> = body["uris"]
        .as_array()
        .map(|uris| {
            uris.iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let mut playlists = state.playlist_tracks.lock().unwrap();
    let Some(tracks) = playlists.get_mut(&id) else {
        return spotify_error(StatusCode::NOT_FOUND, "Resource not found", None);
    };
    tracks.extend(uris);
    let snapshot = format!("snap-{}", tracks.len());

    (StatusCode::CREATED, Json(json!({ "snapshot_id": snapshot }))).into_response()
}

async fn player_command(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): QueryMap,
    body: Bytes,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    state.record(&query);

    if query.get("device_id").map(String::as_str) != Some(ACTIVE_DEVICE) {
        return spotify_error(
            StatusCode::NOT_FOUND,
            "Player command failed: No active device found",
            Some("NO_ACTIVE_DEVICE"),
        );
    }

    *state.last_play_body.lock().unwrap() = serde_json::from_slice(&body).ok();
    StatusCode::NO_CONTENT.into_response()
}

// ============================================================================
// Last.fm
// ============================================================================

async fn lastfm(State(state): State<Arc<MockState>>, Query(query): QueryMap) -> Response {
    state.lastfm_calls.fetch_add(1, Ordering::SeqCst);
    state.record(&query);

    if query.get("api_key").map(String::as_str) != Some(LASTFM_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": 10, "message": "Invalid API key - You must be granted a valid key by last.fm" })),
        )
            .into_response();
    }

    let artist = query.get("artist").map(String::as_str).unwrap_or_default();
    let body = match query.get("method").map(String::as_str) {
        Some("track.getSimilar") if artist == "Unknown" => {
            json!({ "error": 6, "message": "Track not found", "links": [] })
        }
        Some("track.getSimilar") if query.get("track").map(String::as_str) == Some("Loner") => {
            json!({ "similartracks": { "track": [], "@attr": { "artist": artist } } })
        }
        Some("track.getSimilar") => json!({
            "similartracks": {
                "track": [
                    { "name": "Fake Plastic Trees", "match": 0.5, "artist": { "name": "Radiohead" }, "url": "https://www.last.fm/music/Radiohead/_/Fake+Plastic+Trees" },
                    { "name": "Black", "match": 0.9, "artist": { "name": "Pearl Jam" }, "url": "https://www.last.fm/music/Pearl+Jam/_/Black" },
                    { "name": "Song 2", "match": 0.7, "artist": { "name": "Blur" } }
                ],
                "@attr": { "artist": artist }
            }
        }),
        Some("artist.getSimilar") if artist == "Unknown" => {
            json!({ "error": 6, "message": "The artist you supplied could not be found", "links": [] })
        }
        Some("artist.getSimilar") => json!({
            "similarartists": {
                "artist": [
                    { "name": "Thom Yorke", "match": "1", "url": "https://www.last.fm/music/Thom+Yorke" },
                    { "name": "Muse", "match": "0.62" },
                    { "name": "Blur", "match": "0.8" }
                ],
                "@attr": { "artist": artist }
            }
        }),
        _ => json!({ "error": 3, "message": "Invalid Method - No method with that name in this package" }),
    };
    Json(body).into_response()
}
