//! End-to-end download of a catalog entity.
//!
//! `download_entity` validates the URL, resolves the entity, creates
//! `<output root>/<sanitized title>`, runs the batch into it and optionally
//! zips the folder. Catalog errors abort before any track is touched;
//! everything per-track ends up in the [`BatchReport`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::acquire::TrackAcquirer;
use crate::batch::{BatchOrchestrator, BatchReport, DEFAULT_CONCURRENCY, Progress};
use crate::catalog::{CatalogProvider, parse_catalog_url};
use crate::error::{Error, Result};
use crate::model::CatalogEntity;
use crate::output;

/// Per-run settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Parent of the per-entity folder
    pub output_root: PathBuf,
    pub concurrency: usize,
    /// Zip the folder after the batch
    pub archive: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            concurrency: DEFAULT_CONCURRENCY,
            archive: true,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct DownloadSummary {
    pub entity: CatalogEntity,
    pub destination: PathBuf,
    pub report: BatchReport,
    pub archive: Option<PathBuf>,
}

/// Download every track of the entity at `url`
pub async fn download_entity<F>(
    catalog: &dyn CatalogProvider,
    acquirer: Arc<TrackAcquirer>,
    url: &str,
    options: &PipelineOptions,
    on_progress: F,
) -> Result<DownloadSummary>
where
    F: FnMut(Progress) + Send,
{
    // Fail fast on malformed input before any network traffic
    parse_catalog_url(url)?;
    let entity = catalog.fetch_entity(url).await?;

    let destination = options.output_root.join(output::folder_name(&entity.title));
    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|e| Error::create_dir(&destination, e))?;

    tracing::info!(
        kind = %entity.kind,
        title = %entity.title,
        tracks = entity.tracks.len(),
        destination = ?destination,
        "Downloading"
    );

    let orchestrator = BatchOrchestrator::new(acquirer, options.concurrency);
    let report = orchestrator
        .run(entity.tracks.clone(), &destination, on_progress)
        .await;

    let archive = if options.archive {
        let dir = destination.clone();
        Some(tokio::task::spawn_blocking(move || output::package(&dir)).await??)
    } else {
        None
    };

    Ok(DownloadSummary {
        entity,
        destination,
        report,
        archive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::AcquisitionResult;
    use crate::catalog::CatalogError;
    use crate::model::EntityKind;
    use crate::test_utils::{
        MockCatalog, MockFetch, MockSearch, MockTagSink, acquirer_with, candidate, dir_entries,
        mock_track,
    };
    use std::fs::File;
    use tempfile::tempdir;

    fn single_track_entity() -> CatalogEntity {
        CatalogEntity {
            kind: EntityKind::Track,
            title: "Song A".to_string(),
            tracks: vec![mock_track("Song A", "X", 200.0)],
        }
    }

    fn options(root: &std::path::Path, archive: bool) -> PipelineOptions {
        PipelineOptions {
            output_root: root.to_path_buf(),
            concurrency: 3,
            archive,
        }
    }

    #[tokio::test]
    async fn test_single_track_end_to_end() {
        let root = tempdir().unwrap();
        let catalog = MockCatalog::with_entity(single_track_entity());
        let acquirer = acquirer_with(
            MockSearch::with_results(vec![candidate("X - Song A", 201.0, "loc-a")]),
            MockFetch::default(),
            MockTagSink::default(),
        );

        let summary = download_entity(
            &catalog,
            Arc::new(acquirer),
            "https://open.spotify.com/track/abc123",
            &options(root.path(), true),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(summary.report.succeeded, 1);
        assert!(matches!(
            summary.report.results[0],
            AcquisitionResult::Success { .. }
        ));
        assert_eq!(summary.destination, root.path().join("Song A"));
        assert_eq!(dir_entries(&summary.destination), vec!["loc-a.mp3".to_string()]);

        let archive_path = summary.archive.unwrap();
        assert_eq!(archive_path, root.path().join("Song A.zip"));
        let archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_aborts_before_any_work() {
        let root = tempdir().unwrap();
        let search = MockSearch::with_results(vec![]);
        let acquirer = acquirer_with(search.clone(), MockFetch::default(), MockTagSink::default());
        let catalog = MockCatalog::with_entity(single_track_entity());

        let result = download_entity(
            &catalog,
            Arc::new(acquirer),
            "https://www.youtube.com/watch?v=abc",
            &options(root.path(), true),
            |_| {},
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Catalog(CatalogError::InvalidUrl(_)))
        ));
        assert!(search.queries().is_empty());
        assert!(dir_entries(root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_rejected() {
        let root = tempdir().unwrap();
        let catalog = MockCatalog::with_entity(single_track_entity());
        let acquirer = acquirer_with(
            MockSearch::with_results(vec![]),
            MockFetch::default(),
            MockTagSink::default(),
        );

        let result = download_entity(
            &catalog,
            Arc::new(acquirer),
            "https://open.spotify.com/artist/xyz",
            &options(root.path(), false),
            |_| {},
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Catalog(CatalogError::UnsupportedEntityType(_)))
        ));
    }

    #[tokio::test]
    async fn test_catalog_failure_creates_nothing() {
        let root = tempdir().unwrap();
        let catalog = MockCatalog::with_error(CatalogError::NotFound("album x".to_string()));
        let acquirer = acquirer_with(
            MockSearch::with_results(vec![]),
            MockFetch::default(),
            MockTagSink::default(),
        );

        let result = download_entity(
            &catalog,
            Arc::new(acquirer),
            "https://open.spotify.com/album/x",
            &options(root.path(), true),
            |_| {},
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Catalog(CatalogError::NotFound(_)))
        ));
        assert!(dir_entries(root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_playlist_partial_success_without_archive() {
        let root = tempdir().unwrap();
        let catalog = MockCatalog::with_entity(CatalogEntity {
            kind: EntityKind::Playlist,
            title: "Road/Trip".to_string(),
            tracks: vec![
                mock_track("Found", "X", 200.0),
                mock_track("Lost", "X", 200.0),
            ],
        });
        let search = MockSearch::with_results(vec![])
            .on_query("Found X", vec![candidate("X - Found", 199.0, "found")]);
        let acquirer = acquirer_with(search, MockFetch::default(), MockTagSink::default());

        let mut progress = Vec::new();
        let summary = download_entity(
            &catalog,
            Arc::new(acquirer),
            "https://open.spotify.com/playlist/p1",
            &options(root.path(), false),
            |p| progress.push(p),
        )
        .await
        .unwrap();

        assert_eq!(summary.destination, root.path().join("Road_Trip"));
        assert_eq!(summary.report.succeeded, 1);
        assert_eq!(summary.report.unmatched, 1);
        assert!(summary.archive.is_none());
        assert_eq!(progress.last(), Some(&Progress { completed: 2, total: 2 }));
        assert_eq!(dir_entries(root.path()), vec!["Road_Trip".to_string()]);
    }
}
