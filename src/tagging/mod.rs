//! Writing catalog metadata into downloaded audio files.
//!
//! Tagging is best-effort: a file that was fetched but could not be tagged
//! still counts as delivered. [`TagSink::write_tags`] failures and the
//! non-fatal [`TagReport::warnings`] both end up as warnings on the
//! acquisition result rather than failing it.

mod writer;

use std::path::Path;

use async_trait::async_trait;

use crate::model::CatalogTrack;

pub use writer::LoftyTagSink;

/// Fields written into a downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover_art_url: Option<String>,
}

impl TagRequest {
    /// Build the tag set for a catalog track (primary artist only).
    pub fn for_track(track: &CatalogTrack) -> Self {
        Self {
            title: track.name.clone(),
            artist: track.primary_artist().to_string(),
            album: track.album_name.clone(),
            cover_art_url: track.cover_art_url.clone(),
        }
    }
}

/// Outcome of a successful tag write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagReport {
    /// Problems that did not prevent the text tags from being written
    pub warnings: Vec<String>,
}

/// Errors from tag writing
#[derive(Debug, Clone, thiserror::Error)]
pub enum TagError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write tags to {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to fetch cover art: {0}")]
    CoverArt(String),

    #[error("Tagging task failed: {0}")]
    Task(String),
}

/// Writes metadata into an audio file.
#[async_trait]
pub trait TagSink: Send + Sync {
    async fn write_tags(&self, path: &Path, request: &TagRequest) -> Result<TagReport, TagError>;
}

#[async_trait]
impl TagSink for LoftyTagSink {
    async fn write_tags(&self, path: &Path, request: &TagRequest) -> Result<TagReport, TagError> {
        self.write_tags(path, request).await
    }
}
