//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`CatalogError`], [`OutputError`], ...). This enum
//! aggregates them for code that drives a whole run, such as
//! [`crate::pipeline`]. The CLI uses `anyhow` on top.
//!
//! Per-track problems never show up here: they are reported as
//! [`crate::acquire::AcquisitionResult`] values instead.

use std::path::PathBuf;

use crate::catalog::CatalogError;
use crate::output::OutputError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// URL validation or catalog lookup failed; nothing was downloaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Packaging or report export failed
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Could not create the destination directory
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a directory creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
