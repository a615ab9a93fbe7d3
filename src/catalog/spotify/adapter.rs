//! Adapter layer: Convert Spotify DTOs to domain models
//!
//! This is the ONLY place where Spotify DTO types are converted to domain
//! types, and the only place catalog data is validated. Items the pipeline
//! cannot work with (no artists, local files, podcast episodes) are dropped
//! here with a warning.

use super::dto;
use crate::model::{Artist, CatalogTrack};

/// Album context applied to tracks from an album listing
pub struct AlbumContext<'a> {
    pub name: &'a str,
    pub images: &'a [dto::Image],
}

/// Convert a full track object. Returns `None` if the track is unusable.
pub fn to_catalog_track(track: dto::Track) -> Option<CatalogTrack> {
    let (album_name, cover_art_url) = match &track.album {
        Some(album) => (album.name.clone(), best_image_url(&album.images)),
        None => (String::new(), None),
    };
    build_track(track, album_name, cover_art_url)
}

/// Convert a track from an album listing, which carries no album of its own.
pub fn to_album_track(track: dto::Track, album: &AlbumContext<'_>) -> Option<CatalogTrack> {
    build_track(
        track,
        album.name.to_string(),
        best_image_url(album.images),
    )
}

/// Convert a playlist item, skipping removed entries.
pub fn from_playlist_item(item: dto::PlaylistItem) -> Option<CatalogTrack> {
    let Some(track) = item.track else {
        tracing::debug!("Skipping unavailable playlist item");
        return None;
    };
    to_catalog_track(track)
}

fn build_track(
    track: dto::Track,
    album_name: String,
    cover_art_url: Option<String>,
) -> Option<CatalogTrack> {
    if track.kind.as_deref().is_some_and(|kind| kind != "track") {
        tracing::warn!(name = %track.name, kind = ?track.kind, "Skipping non-track item");
        return None;
    }
    if track.is_local {
        tracing::warn!(name = %track.name, "Skipping local file");
        return None;
    }

    let artists: Vec<Artist> = track
        .artists
        .into_iter()
        .map(|a| a.name)
        .filter(|name| !name.trim().is_empty())
        .map(Artist::new)
        .collect();

    if artists.is_empty() {
        tracing::warn!(name = %track.name, "Skipping track without artists");
        return None;
    }

    Some(CatalogTrack {
        name: track.name,
        artists,
        duration_seconds: track.duration_ms as f64 / 1000.0,
        album_name,
        cover_art_url,
    })
}

/// Pick the largest image. Spotify lists images widest first, but the
/// order is not documented, so compare sizes when they are present.
fn best_image_url(images: &[dto::Image]) -> Option<String> {
    images
        .iter()
        .enumerate()
        .max_by_key(|(index, image)| {
            let area = image.width.unwrap_or(0) as u64 * image.height.unwrap_or(0) as u64;
            // Fall back to list order (earlier wins) when sizes are unknown
            (area, std::cmp::Reverse(*index))
        })
        .map(|(_, image)| image.url.clone())
}
