//! Catalog provider - resolves a catalog URL into typed track records.
//!
//! # Architecture
//!
//! Follows the same split as the other external integrations:
//! - **URL validation** ([`parse_catalog_url`]) - rejects foreign or unsupported URLs
//!   before any network traffic
//! - **DTOs** (`spotify/dto.rs`) - exact Web API response shapes
//! - **Adapter** (`spotify/adapter.rs`) - converts DTOs into [`CatalogTrack`]s
//! - **Client** (`spotify/client.rs`) - HTTP, auth and pagination
//!
//! The rest of the crate only sees the [`CatalogProvider`] trait.

pub mod spotify;

use async_trait::async_trait;
use reqwest::Url;

use crate::model::{CatalogEntity, EntityKind};

pub use spotify::SpotifyClient;

/// Host every accepted catalog URL must use.
pub const CATALOG_HOST: &str = "open.spotify.com";

/// Errors from catalog lookups. All of them abort a run before any
/// acquisition starts.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported catalog entity type: {0}")]
    UnsupportedEntityType(String),

    #[error("Catalog entry not found: {0}")]
    NotFound(String),

    #[error("Catalog credentials missing: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// A validated reference to a catalog entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    pub kind: EntityKind,
    pub id: String,
}

/// Parse and validate a catalog URL such as
/// `https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy?si=...`.
pub fn parse_catalog_url(url: &str) -> Result<CatalogRef, CatalogError> {
    let invalid = || CatalogError::InvalidUrl(url.to_string());

    let parsed = Url::parse(url.trim()).map_err(|_| invalid())?;
    if parsed.scheme() != "https" || parsed.host_str() != Some(CATALOG_HOST) {
        return Err(invalid());
    }

    let mut segments = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|s| !s.is_empty())
        .peekable();

    // Localized links look like /intl-pt/track/<id>
    if segments.peek().is_some_and(|s| s.starts_with("intl-")) {
        segments.next();
    }

    let kind = match segments.next() {
        Some("track") => EntityKind::Track,
        Some("album") => EntityKind::Album,
        Some("playlist") => EntityKind::Playlist,
        Some(other) => return Err(CatalogError::UnsupportedEntityType(other.to_string())),
        None => return Err(CatalogError::UnsupportedEntityType(String::new())),
    };

    let id = segments.next().ok_or_else(invalid)?.to_string();

    Ok(CatalogRef { kind, id })
}

/// Source of catalog entities.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Resolve a catalog URL into its title and tracks.
    async fn fetch_entity(&self, url: &str) -> Result<CatalogEntity, CatalogError>;
}

#[async_trait]
impl CatalogProvider for SpotifyClient {
    async fn fetch_entity(&self, url: &str) -> Result<CatalogEntity, CatalogError> {
        self.fetch_entity(url).await
    }
}
