//! yt-dlp JSON output shapes.
//!
//! Only the fields we read are declared; yt-dlp emits many more.
//! DO NOT use these types outside the media module - convert to
//! [`CandidateResult`](crate::model::CandidateResult).

use serde::Deserialize;

/// Output of `yt-dlp --dump-single-json "ytsearchN:..."`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPlaylist {
    /// One entry per search hit, in relevance order
    #[serde(default)]
    pub entries: Vec<Option<VideoEntry>>,
}

/// A single video in the search playlist
#[derive(Debug, Clone, Deserialize)]
pub struct VideoEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Duration in seconds (may be fractional or absent for live streams)
    pub duration: Option<f64>,
    /// Canonical watch page
    pub webpage_url: Option<String>,
    /// Present instead of `webpage_url` in flat extraction mode
    pub url: Option<String>,
}
