//! Core data models shared by the catalog, matching and acquisition layers.
//!
//! These are OUR types. Catalog and media provider responses are converted
//! into them at the boundary (see `catalog::spotify::adapter` and
//! `media::ytdlp`), so the core never deals with missing fields.

use serde::{Deserialize, Serialize};

/// An artist credited on a catalog track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub name: String,
}

impl Artist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A track as described by the catalog provider.
///
/// Immutable once fetched. The catalog adapter guarantees `artists` is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    /// Track title
    pub name: String,
    /// Credited artists, primary artist first
    pub artists: Vec<Artist>,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Album title
    pub album_name: String,
    /// Album artwork URL (largest image offered by the provider)
    pub cover_art_url: Option<String>,
}

impl CatalogTrack {
    /// Name of the first credited artist, or an empty string.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(|a| a.name.as_str()).unwrap_or("")
    }

    /// Query string sent to the media search engine.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.name, self.primary_artist())
    }

    /// Human-readable label used in logs and reports.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.primary_artist())
    }
}

/// A single result returned by the media search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub title: String,
    /// Duration in seconds, 0 when the engine did not report one
    pub duration_seconds: f64,
    /// Opaque handle passed back to the fetch capability
    pub locator: String,
}

/// Kind of catalog entity a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Track,
    Album,
    Playlist,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Track => write!(f, "track"),
            EntityKind::Album => write!(f, "album"),
            EntityKind::Playlist => write!(f, "playlist"),
        }
    }
}

/// A resolved catalog entry: one track, an album or a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub kind: EntityKind,
    pub title: String,
    pub tracks: Vec<CatalogTrack>,
}
