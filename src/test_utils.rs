//! Test utilities and fixtures for tunefetch tests.
//!
//! Provides track/candidate factories and in-memory doubles for every
//! external collaborator (catalog, search, fetch, tagging), so pipeline
//! tests never touch the network or external tools.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{acquirer_with, candidate, mock_track, MockFetch, MockSearch, MockTagSink};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let search = MockSearch::with_results(vec![candidate("X - Song", 200.0, "loc")]);
//!     let acquirer = acquirer_with(search, MockFetch::default(), MockTagSink::default());
//!     // ... test logic
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::acquire::{AcquireConfig, TrackAcquirer};
use crate::catalog::{CatalogError, CatalogProvider, parse_catalog_url};
use crate::matching::MatchSelector;
use crate::media::{FetchCapability, FetchOptions, MediaError, SearchCapability};
use crate::model::{Artist, CandidateResult, CatalogEntity, CatalogTrack};
use crate::tagging::{TagError, TagReport, TagRequest, TagSink};

/// Creates a CatalogTrack with a single artist and sensible defaults.
///
/// Customize with struct update syntax:
///
/// ```ignore
/// let track = CatalogTrack {
///     album_name: "Custom".to_string(),
///     ..mock_track("Song", "Artist", 180.0)
/// };
/// ```
pub fn mock_track(name: &str, artist: &str, duration_seconds: f64) -> CatalogTrack {
    CatalogTrack {
        name: name.to_string(),
        artists: vec![Artist::new(artist)],
        duration_seconds,
        album_name: "Test Album".to_string(),
        cover_art_url: None,
    }
}

/// Creates a search result.
pub fn candidate(title: &str, duration_seconds: f64, locator: &str) -> CandidateResult {
    CandidateResult {
        title: title.to_string(),
        duration_seconds,
        locator: locator.to_string(),
    }
}

/// Builds an acquirer with default matching and acquisition settings.
pub fn acquirer_with(search: MockSearch, fetch: MockFetch, tags: MockTagSink) -> TrackAcquirer {
    TrackAcquirer::new(
        Arc::new(search),
        Arc::new(fetch),
        Arc::new(tags),
        MatchSelector::default(),
        AcquireConfig::default(),
    )
}

/// Sorted names of the entries in a directory.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Counts calls running at the same moment, optionally shared by several
/// doubles so one counter covers a whole acquisition.
#[derive(Clone, Default)]
pub struct InFlight {
    current: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard {
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(running, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.current))
    }

    /// Highest number of calls observed running at once.
    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Search
// ============================================================================

/// Search double with configurable results, latency and concurrency tracking.
#[derive(Clone)]
pub struct MockSearch {
    /// Results for any query without an override
    default: Result<Vec<CandidateResult>, MediaError>,
    /// Per-query results
    overrides: HashMap<String, Result<Vec<CandidateResult>, MediaError>>,
    delay: Option<Duration>,
    queries: Arc<Mutex<Vec<(String, usize)>>>,
    in_flight: InFlight,
}

impl MockSearch {
    /// Return the same candidates for every query.
    pub fn with_results(results: Vec<CandidateResult>) -> Self {
        Self {
            default: Ok(results),
            overrides: HashMap::new(),
            delay: None,
            queries: Arc::default(),
            in_flight: InFlight::default(),
        }
    }

    /// Fail every query.
    pub fn with_error(error: MediaError) -> Self {
        Self {
            default: Err(error),
            ..Self::with_results(vec![])
        }
    }

    /// Return `results` for this exact query.
    pub fn on_query(mut self, query: &str, results: Vec<CandidateResult>) -> Self {
        self.overrides.insert(query.to_string(), Ok(results));
        self
    }

    /// Fail this exact query.
    pub fn fail_query(mut self, query: &str, error: MediaError) -> Self {
        self.overrides.insert(query.to_string(), Err(error));
        self
    }

    /// Sleep before answering, to simulate network latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report running searches to `counter` instead of a private one.
    pub fn tracking(mut self, counter: &InFlight) -> Self {
        self.in_flight = counter.clone();
        self
    }

    /// All (query, limit) pairs received so far.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().clone()
    }

    /// Highest number of searches observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max()
    }
}

#[async_trait]
impl SearchCapability for MockSearch {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, MediaError> {
        self.queries.lock().push((query.to_string(), limit));

        let _running = self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.overrides
            .get(query)
            .unwrap_or(&self.default)
            .clone()
            .map(|mut results| {
                results.truncate(limit);
                results
            })
    }
}

// ============================================================================
// Fetch
// ============================================================================

/// Fetch double that writes `<locator>.<extension>` into the destination.
#[derive(Clone, Default)]
pub struct MockFetch {
    failing: HashSet<String>,
    produce_nothing: bool,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: InFlight,
}

impl MockFetch {
    /// Fail for the given locators, succeed for everything else.
    pub fn failing_for(locators: &[&str]) -> Self {
        Self {
            failing: locators.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Report success without writing a file.
    pub fn producing_nothing() -> Self {
        Self {
            produce_nothing: true,
            ..Default::default()
        }
    }

    /// Sleep before writing, to simulate download time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report running downloads to `counter` instead of a private one.
    pub fn tracking(mut self, counter: &InFlight) -> Self {
        self.in_flight = counter.clone();
        self
    }

    /// Locators fetched so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Highest number of downloads observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max()
    }
}

#[async_trait]
impl FetchCapability for MockFetch {
    async fn fetch(
        &self,
        locator: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), MediaError> {
        self.calls.lock().push(locator.to_string());

        let _running = self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(locator) {
            return Err(MediaError::Fetch(format!("extraction failed for {}", locator)));
        }
        if self.produce_nothing {
            return Ok(());
        }

        let path = destination.join(format!("{}.{}", locator, options.audio_format.extension()));
        tokio::fs::write(&path, b"ID3 fake audio")
            .await
            .map_err(|e| MediaError::Fetch(e.to_string()))
    }
}

// ============================================================================
// Tagging
// ============================================================================

/// Tag sink double that records requests.
#[derive(Clone, Default)]
pub struct MockTagSink {
    error: Option<TagError>,
    warnings: Vec<String>,
    requests: Arc<Mutex<Vec<TagRequest>>>,
}

impl MockTagSink {
    /// Fail every write.
    pub fn with_error(error: TagError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// Succeed with a non-fatal warning.
    pub fn with_warning(warning: &str) -> Self {
        Self {
            warnings: vec![warning.to_string()],
            ..Default::default()
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<TagRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TagSink for MockTagSink {
    async fn write_tags(&self, path: &Path, request: &TagRequest) -> Result<TagReport, TagError> {
        assert!(path.exists(), "tagging a file that does not exist: {:?}", path);
        self.requests.lock().push(request.clone());

        if let Some(ref err) = self.error {
            return Err(err.clone());
        }
        Ok(TagReport {
            warnings: self.warnings.clone(),
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog double returning a fixed entity for any valid URL.
pub struct MockCatalog {
    result: Result<CatalogEntity, CatalogError>,
}

impl MockCatalog {
    pub fn with_entity(entity: CatalogEntity) -> Self {
        Self { result: Ok(entity) }
    }

    pub fn with_error(error: CatalogError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl CatalogProvider for MockCatalog {
    async fn fetch_entity(&self, url: &str) -> Result<CatalogEntity, CatalogError> {
        // Same validation as the real provider
        parse_catalog_url(url)?;
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;

    #[test]
    fn test_mock_track_defaults() {
        let track = mock_track("Test Track", "Test Artist", 180.0);
        assert_eq!(track.name, "Test Track");
        assert_eq!(track.primary_artist(), "Test Artist");
        assert_eq!(track.album_name, "Test Album");
        assert_eq!(track.duration_seconds, 180.0);
        assert!(track.cover_art_url.is_none());
    }

    #[tokio::test]
    async fn test_mock_search_override_and_limit() {
        let search = MockSearch::with_results(vec![
            candidate("a", 1.0, "a"),
            candidate("b", 1.0, "b"),
        ])
        .on_query("special", vec![candidate("s", 1.0, "s")]);

        let default = search.search("anything", 1).await.unwrap();
        assert_eq!(default.len(), 1);
        assert_eq!(default[0].locator, "a");

        let special = search.search("special", 5).await.unwrap();
        assert_eq!(special[0].locator, "s");
        assert_eq!(search.queries().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_search_error() {
        let search = MockSearch::with_results(vec![])
            .fail_query("bad", MediaError::Search("timeout".to_string()));
        let result = search.search("bad", 5).await;
        assert!(matches!(result, Err(MediaError::Search(_))));
    }

    #[tokio::test]
    async fn test_mock_fetch_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = MockFetch::default();

        fetch
            .fetch("abc", dir.path(), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(dir_entries(dir.path()), vec!["abc.mp3".to_string()]);
        assert_eq!(fetch.calls(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_counter_sees_search_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let counter = InFlight::default();
        let search = MockSearch::with_results(vec![])
            .with_delay(Duration::from_millis(20))
            .tracking(&counter);
        let fetch = MockFetch::default()
            .with_delay(Duration::from_millis(20))
            .tracking(&counter);

        let options = FetchOptions::default();
        let (searched, fetched) = tokio::join!(
            search.search("q", 1),
            fetch.fetch("abc", dir.path(), &options)
        );
        searched.unwrap();
        fetched.unwrap();

        assert_eq!(counter.max(), 2);
        assert_eq!(search.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_mock_catalog_validates_url() {
        let catalog = MockCatalog::with_entity(CatalogEntity {
            kind: EntityKind::Track,
            title: "t".to_string(),
            tracks: vec![],
        });

        let result = catalog.fetch_entity("https://example.com/track/1").await;
        assert!(matches!(result, Err(CatalogError::InvalidUrl(_))));

        let result = catalog
            .fetch_entity("https://open.spotify.com/track/1")
            .await;
        assert!(result.is_ok());
    }
}
