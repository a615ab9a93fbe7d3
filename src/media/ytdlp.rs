//! Media search and download via the `yt-dlp` command-line tool
//!
//! Searching uses yt-dlp's `ytsearchN:` pseudo-URL with `--dump-single-json`,
//! so nothing is downloaded. Fetching extracts the best audio stream and
//! converts it with ffmpeg, which yt-dlp requires for `--extract-audio`.
//!
//! Install:
//! - Windows: `winget install yt-dlp.yt-dlp` (bundles ffmpeg via `winget install Gyan.FFmpeg`)
//! - macOS: `brew install yt-dlp ffmpeg`
//! - Linux: `pipx install yt-dlp` and `apt install ffmpeg`

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use super::dto::SearchPlaylist;
use super::{FetchOptions, MediaError};
use crate::model::CandidateResult;

/// Output template; yt-dlp names files after the video title.
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// yt-dlp process wrapper
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    /// Create a wrapper around the given executable (name on PATH or full path)
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Search for up to `limit` videos matching `query`
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, MediaError> {
        let target = format!("ytsearch{}:{}", limit, query);
        tracing::debug!(query, limit, "Searching with yt-dlp");

        let output = self
            .command()
            .args(["--dump-single-json", "--skip-download", "--no-warnings"])
            .arg(&target)
            .output()
            .await
            .map_err(|e| self.spawn_error(e, MediaError::Search))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Search(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_search_output(&stdout)
    }

    /// Download the audio behind `locator` into `destination`
    pub async fn fetch(
        &self,
        locator: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), MediaError> {
        let template = destination.join(OUTPUT_TEMPLATE);
        tracing::debug!(locator, destination = ?destination, "Fetching with yt-dlp");

        let output = self
            .command()
            .args(["--quiet", "--no-warnings", "--no-playlist"])
            .args(["--format", "bestaudio/best", "--extract-audio"])
            .args(["--audio-format", options.audio_format.codec_name()])
            .arg("--audio-quality")
            .arg(format!("{}K", options.bitrate_kbps))
            .arg("--output")
            .arg(&template)
            .arg(locator)
            .output()
            .await
            .map_err(|e| self.spawn_error(e, MediaError::Fetch))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Fetch(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Check if the executable can be run
    pub fn is_available(&self) -> bool {
        self.version().is_some()
    }

    /// Get yt-dlp version string (for diagnostics)
    pub fn version(&self) -> Option<String> {
        tool_version(&self.program, "--version")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out acquisition drops the future; take the child with it.
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, e: std::io::Error, wrap: fn(String) -> MediaError) -> MediaError {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::ToolNotFound(self.program.display().to_string())
        } else {
            wrap(format!("Failed to run {}: {}", self.program.display(), e))
        }
    }
}

/// Get the first line of `<program> <flag>` output, if the program runs
pub fn tool_version(program: &Path, flag: &str) -> Option<String> {
    std::process::Command::new(program)
        .arg(flag)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| {
            String::from_utf8_lossy(&o.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
        })
}

/// Parse the JSON written by a `ytsearchN:` query
fn parse_search_output(json: &str) -> Result<Vec<CandidateResult>, MediaError> {
    let playlist: SearchPlaylist =
        serde_json::from_str(json).map_err(|e| MediaError::Parse(e.to_string()))?;

    let candidates = playlist
        .entries
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let Some(locator) = entry.webpage_url.or(entry.url) else {
                tracing::debug!(id = ?entry.id, "Dropping search entry without a URL");
                return None;
            };
            Some(CandidateResult {
                title: entry.title.unwrap_or_default(),
                duration_seconds: entry.duration.unwrap_or(0.0),
                locator,
            })
        })
        .collect();

    Ok(candidates)
}
