//! Spotify Web API Data Transfer Objects
//!
//! These types match what the Web API returns, restricted to the fields we
//! read. DO NOT use these types outside the spotify module - convert to
//! domain types in `adapter.rs`.
//!
//! API Reference: https://developer.spotify.com/documentation/web-api

use serde::Deserialize;

/// Client-credentials token response (`POST /api/token`)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Artist reference embedded in track objects
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedArtist {
    pub name: String,
}

/// Album artwork at one resolution
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Album reference embedded in full track objects
#[derive(Debug, Clone, Deserialize)]
pub struct SimplifiedAlbum {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Track object (`GET /v1/tracks/{id}`, album and playlist items)
///
/// Album track listings omit `album`; playlist items may be local files.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SimplifiedArtist>,
    pub duration_ms: u64,
    pub album: Option<SimplifiedAlbum>,
    #[serde(default)]
    pub is_local: bool,
    /// "track" or "episode" (playlists can contain podcast episodes)
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A page of results with a link to the next one
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Absolute URL of the next page
    pub next: Option<String>,
}

/// Album object (`GET /v1/albums/{id}`)
#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    pub tracks: Paging<Track>,
}

/// Playlist item wrapper; `track` is null for removed or unavailable items
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<Track>,
}

/// Playlist object (`GET /v1/playlists/{id}`)
#[derive(Debug, Clone, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub tracks: Paging<PlaylistItem>,
}
