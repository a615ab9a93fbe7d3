//! Media search and fetch capabilities.
//!
//! The acquisition pipeline only talks to the [`SearchCapability`] and
//! [`FetchCapability`] traits. Production code uses [`YtDlp`], which shells
//! out to the `yt-dlp` tool; tests substitute in-memory doubles.

pub mod dto;
pub mod ytdlp;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::CandidateResult;

pub use ytdlp::YtDlp;

/// Audio codecs yt-dlp can extract to.
///
/// The codec name passed to `--audio-format` is not always the extension of
/// the file it writes (`vorbis` produces `.ogg`, `alac` produces `.m4a`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
    Opus,
    Vorbis,
    Flac,
    Alac,
    Wav,
}

impl AudioFormat {
    /// Value for yt-dlp's `--audio-format`
    pub fn codec_name(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Flac => "flac",
            AudioFormat::Alac => "alac",
            AudioFormat::Wav => "wav",
        }
    }

    /// Extension of the produced file
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Vorbis => "ogg",
            AudioFormat::Alac => "m4a",
            other => other.codec_name(),
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codec_name())
    }
}

/// How fetched audio should be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub audio_format: AudioFormat,
    /// Target bitrate in kbps
    pub bitrate_kbps: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::Mp3,
            bitrate_kbps: 192,
        }
    }
}

/// Errors from the media search/fetch layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MediaError {
    #[error("Search failed: {0}")]
    Search(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("{0} not found. Install it or set its path in the config file")]
    ToolNotFound(String),

    #[error("Failed to parse tool output: {0}")]
    Parse(String),
}

/// Searches the media index for candidates.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Return up to `limit` candidates for `query`, most relevant first.
    async fn search(&self, query: &str, limit: usize)
    -> Result<Vec<CandidateResult>, MediaError>;
}

/// Downloads the audio of a selected candidate.
#[async_trait]
pub trait FetchCapability: Send + Sync {
    /// Retrieve the audio behind `locator` into `destination`.
    ///
    /// The produced file is named by the implementation's own convention.
    async fn fetch(
        &self,
        locator: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), MediaError>;
}

#[async_trait]
impl SearchCapability for YtDlp {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, MediaError> {
        self.search(query, limit).await
    }
}

#[async_trait]
impl FetchCapability for YtDlp {
    async fn fetch(
        &self,
        locator: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), MediaError> {
        self.fetch(locator, destination, options).await
    }
}
