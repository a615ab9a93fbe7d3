//! Batch orchestration - acquire many tracks with bounded concurrency.
//!
//! Every track runs as its own spawned task inside a `buffer_unordered`
//! stream, so at most `concurrency_limit` acquisitions are in flight and a
//! panicking unit is reported as `Failed` instead of tearing down the batch.
//! Results arrive in completion order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{StreamExt, stream};
use serde::{Serialize, Serializer};

use crate::acquire::{AcquisitionResult, TrackAcquirer};
use crate::model::CatalogTrack;

/// Default number of concurrent acquisitions
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Progress after each finished track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Aggregated outcome of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Results in completion order
    pub results: Vec<AcquisitionResult>,
    pub total: usize,
    pub succeeded: usize,
    pub unmatched: usize,
    pub failed: usize,
    #[serde(rename = "elapsed_seconds", serialize_with = "as_seconds")]
    pub elapsed: Duration,
}

impl BatchReport {
    fn new(total: usize, results: Vec<AcquisitionResult>, elapsed: Duration) -> Self {
        let mut report = Self {
            total,
            succeeded: 0,
            unmatched: 0,
            failed: 0,
            elapsed,
            results: Vec::new(),
        };
        for result in &results {
            match result {
                AcquisitionResult::Success { .. } => report.succeeded += 1,
                AcquisitionResult::Unmatched(_) => report.unmatched += 1,
                AcquisitionResult::Failed { .. } => report.failed += 1,
            }
        }
        report.results = results;
        report
    }

    /// Every submitted track has a result
    pub fn is_complete(&self) -> bool {
        self.results.len() == self.total
    }

    /// Paths of the downloaded files
    pub fn downloaded_paths(&self) -> impl Iterator<Item = &Path> {
        self.results.iter().filter_map(|r| match r {
            AcquisitionResult::Success { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }
}

fn as_seconds<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Runs a [`TrackAcquirer`] over many tracks
pub struct BatchOrchestrator {
    acquirer: Arc<TrackAcquirer>,
    concurrency_limit: usize,
}

impl BatchOrchestrator {
    /// A limit of 0 is treated as 1.
    pub fn new(acquirer: Arc<TrackAcquirer>, concurrency_limit: usize) -> Self {
        Self {
            acquirer,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Acquire every track into `destination`, calling `on_progress` after
    /// each one finishes. Returns once all tracks have a result.
    pub async fn run<F>(
        &self,
        tracks: Vec<CatalogTrack>,
        destination: &Path,
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(Progress) + Send,
    {
        let total = tracks.len();
        let started = Instant::now();
        let destination: Arc<PathBuf> = Arc::new(destination.to_path_buf());

        tracing::info!(
            total,
            concurrency = self.concurrency_limit,
            destination = ?destination,
            "Starting batch"
        );

        let mut results_stream = stream::iter(tracks)
            .map(|track| {
                let acquirer = Arc::clone(&self.acquirer);
                let destination = Arc::clone(&destination);
                async move {
                    let fallback = track.clone();
                    let handle =
                        tokio::spawn(async move { acquirer.acquire(&track, &destination).await });
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(track = %fallback.label(), "Acquisition task aborted: {}", e);
                            AcquisitionResult::Failed {
                                track: fallback,
                                error: format!("acquisition task aborted: {}", e),
                            }
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency_limit);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = results_stream.next().await {
            results.push(result);
            let progress = Progress {
                completed: results.len(),
                total,
            };
            tracing::info!(completed = progress.completed, total, "Progress");
            on_progress(progress);
        }

        let report = BatchReport::new(total, results, started.elapsed());
        tracing::info!(
            succeeded = report.succeeded,
            unmatched = report.unmatched,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch complete"
        );
        report
    }
}
