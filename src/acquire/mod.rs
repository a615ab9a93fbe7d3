//! Track acquisition - search, match, download and tag one catalog track.
//!
//! Flow for a single track:
//! 1. Search the media index for `"{name} {primary artist}"`
//! 2. Pick a candidate with the [`MatchSelector`]
//! 3. Fetch its audio into a private staging directory inside the destination
//! 4. Find the produced file, tag it, and move it into the destination
//!
//! Every failure is caught here and turned into an [`AcquisitionResult`], so
//! one bad track never affects the others. The staging directory means
//! concurrent units never see each other's partially written files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::matching::{MatchOutcome, MatchScore, MatchSelector};
use crate::media::{FetchCapability, FetchOptions, MediaError, SearchCapability};
use crate::model::{CandidateResult, CatalogTrack};
use crate::tagging::{TagRequest, TagSink};

/// Prefix of per-track staging directories
const STAGING_PREFIX: &str = ".staging-";

/// Tunables for a single acquisition
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Number of candidates requested from the search engine
    pub search_limit: usize,
    /// Output encoding
    pub fetch: FetchOptions,
    /// Upper bound for one search call
    pub search_timeout: Duration,
    /// Upper bound for one download (including transcoding)
    pub fetch_timeout: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            search_limit: 5,
            fetch: FetchOptions::default(),
            search_timeout: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(600),
        }
    }
}

/// The closest rejected candidate, for manual follow-up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestCandidate {
    pub candidate: CandidateResult,
    pub score: MatchScore,
}

/// Why a track was not downloaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub track: CatalogTrack,
    /// `None` when the search returned no results at all
    pub best: Option<BestCandidate>,
}

/// Outcome of acquiring one track
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquisitionResult {
    /// File downloaded into the destination
    Success {
        track: CatalogTrack,
        path: PathBuf,
        /// Non-fatal problems (tagging, cover art)
        warnings: Vec<String>,
    },
    /// No candidate was good enough; nothing was downloaded
    Unmatched(Diagnostic),
    /// Search, download or file handling failed
    Failed { track: CatalogTrack, error: String },
}

impl AcquisitionResult {
    /// The catalog track this result belongs to
    pub fn track(&self) -> &CatalogTrack {
        match self {
            AcquisitionResult::Success { track, .. } => track,
            AcquisitionResult::Unmatched(diagnostic) => &diagnostic.track,
            AcquisitionResult::Failed { track, .. } => track,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AcquisitionResult::Success { .. })
    }
}

/// Internal failure reasons, reported as [`AcquisitionResult::Failed`]
#[derive(Debug, thiserror::Error)]
enum AcquireError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Staging error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download finished but no .{extension} file was produced in {}", dir.display())]
    NoOutput { dir: PathBuf, extension: String },
}

/// Acquires single tracks using the injected collaborators
pub struct TrackAcquirer {
    search: Arc<dyn SearchCapability>,
    fetcher: Arc<dyn FetchCapability>,
    tagger: Arc<dyn TagSink>,
    selector: MatchSelector,
    config: AcquireConfig,
}

impl TrackAcquirer {
    pub fn new(
        search: Arc<dyn SearchCapability>,
        fetcher: Arc<dyn FetchCapability>,
        tagger: Arc<dyn TagSink>,
        selector: MatchSelector,
        config: AcquireConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            tagger,
            selector,
            config,
        }
    }

    pub fn config(&self) -> &AcquireConfig {
        &self.config
    }

    /// Search for `track` and return the selector's decision without downloading
    pub async fn preview(&self, track: &CatalogTrack) -> Result<MatchOutcome, MediaError> {
        let candidates = self.search_candidates(track).await.map_err(|e| match e {
            AcquireError::Media(media) => media,
            other => MediaError::Search(other.to_string()),
        })?;
        Ok(self.selector.select(track, &candidates))
    }

    /// Acquire one track into `destination`
    pub async fn acquire(&self, track: &CatalogTrack, destination: &Path) -> AcquisitionResult {
        match self.try_acquire(track, destination).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(track = %track.label(), "Acquisition failed: {}", e);
                AcquisitionResult::Failed {
                    track: track.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_acquire(
        &self,
        track: &CatalogTrack,
        destination: &Path,
    ) -> Result<AcquisitionResult, AcquireError> {
        let candidates = self.search_candidates(track).await?;

        let candidate = match self.selector.select(track, &candidates) {
            MatchOutcome::Accepted(candidate) => candidate,
            MatchOutcome::NoConfidentMatch { best, score, track } => {
                tracing::info!(
                    track = %track.label(),
                    best = %best.title,
                    title = score.title_similarity,
                    artist = score.artist_similarity,
                    delta = score.duration_delta_seconds,
                    "No confident match"
                );
                return Ok(AcquisitionResult::Unmatched(Diagnostic {
                    track,
                    best: Some(BestCandidate {
                        candidate: best,
                        score,
                    }),
                }));
            }
            MatchOutcome::NoCandidates => {
                tracing::info!(track = %track.label(), "Search returned no candidates");
                return Ok(AcquisitionResult::Unmatched(Diagnostic {
                    track: track.clone(),
                    best: None,
                }));
            }
        };

        // Removed on drop, whichever way this function exits
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(destination)?;

        tracing::debug!(
            track = %track.label(),
            candidate = %candidate.title,
            locator = %candidate.locator,
            "Fetching"
        );
        let fetch = self
            .fetcher
            .fetch(&candidate.locator, staging.path(), &self.config.fetch);
        with_timeout("fetch", self.config.fetch_timeout, fetch).await??;

        let extension = self.config.fetch.audio_format.extension();
        let produced = newest_audio_file(staging.path(), extension)
            .await?
            .ok_or_else(|| AcquireError::NoOutput {
                dir: staging.path().to_path_buf(),
                extension: extension.to_string(),
            })?;

        let mut warnings = Vec::new();
        match self
            .tagger
            .write_tags(&produced, &TagRequest::for_track(track))
            .await
        {
            Ok(report) => warnings.extend(report.warnings),
            Err(e) => {
                tracing::warn!(track = %track.label(), "Tagging failed: {}", e);
                warnings.push(e.to_string());
            }
        }

        let path = move_into(&produced, destination).await?;
        tracing::info!(track = %track.label(), path = ?path, "Downloaded");

        Ok(AcquisitionResult::Success {
            track: track.clone(),
            path,
            warnings,
        })
    }

    async fn search_candidates(
        &self,
        track: &CatalogTrack,
    ) -> Result<Vec<CandidateResult>, AcquireError> {
        let query = track.search_query();
        let search = self.search.search(&query, self.config.search_limit);
        let candidates = with_timeout("search", self.config.search_timeout, search).await??;
        tracing::debug!(%query, candidates = candidates.len(), "Search complete");
        Ok(candidates)
    }
}

async fn with_timeout<F: std::future::Future>(
    operation: &'static str,
    after: Duration,
    future: F,
) -> Result<F::Output, AcquireError> {
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| AcquireError::Timeout { operation, after })
}

/// Find the most recently modified file with the given extension in `dir`
async fn newest_audio_file(dir: &Path, extension: &str) -> std::io::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches_extension {
            continue;
        }

        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if newest.as_ref().is_none_or(|(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Move `file` into `destination`, adding " (2)", " (3)", ... to the name
/// when it is already taken
async fn move_into(file: &Path, destination: &Path) -> std::io::Result<PathBuf> {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "track".to_string());
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (file_name.clone(), None),
    };

    let mut attempt = 1;
    loop {
        let name = match (attempt, &extension) {
            (1, _) => file_name.clone(),
            (n, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
            (n, None) => format!("{} ({})", stem, n),
        };
        let target = destination.join(name);

        // Reserve the name atomically so concurrent units cannot pick it too
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(_) => {
                if let Err(e) = tokio::fs::rename(file, &target).await {
                    // Drop the reservation so a failed track leaves nothing behind
                    if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                        tracing::warn!(path = ?target, "Failed to remove placeholder: {}", cleanup);
                    }
                    return Err(e);
                }
                return Ok(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}
