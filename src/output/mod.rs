//! Output handling: destination naming, zip packaging and report export.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::batch::BatchReport;
use crate::model::{CatalogEntity, EntityKind};

/// Used when an entity title sanitizes to nothing
const FALLBACK_FOLDER_NAME: &str = "download";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Replaces characters that are invalid in file names on common platforms
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}

/// Folder name for an entity's downloads
pub fn folder_name(title: &str) -> String {
    let sanitized = sanitize_filename(title);
    // Windows rejects trailing dots and spaces
    let trimmed = sanitized.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() || trimmed == "." {
        FALLBACK_FOLDER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Zip the contents of `dir` into `<dir>.zip` next to it.
///
/// Entries are stored relative to `dir`. Leftover staging directories are
/// skipped. An existing archive is replaced.
pub fn package(dir: &Path) -> Result<PathBuf, OutputError> {
    if !dir.is_dir() {
        return Err(OutputError::NotADirectory(dir.to_path_buf()));
    }

    let mut archive_name = dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| FALLBACK_FOLDER_NAME.into());
    archive_name.push(".zip");
    let archive_path = dir.with_file_name(archive_name);

    let file = File::create(&archive_path).map_err(io_error(&archive_path))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_staging(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|e| OutputError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        // Zip entry names always use forward slashes
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options)?;
            let mut source = File::open(entry.path()).map_err(io_error(entry.path()))?;
            io::copy(&mut source, &mut writer).map_err(io_error(entry.path()))?;
            entries += 1;
        }
    }

    writer.finish()?;
    tracing::info!(archive = ?archive_path, files = entries, "Created archive");
    Ok(archive_path)
}

fn is_staging(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with(".staging-")
}

/// JSON report written after a run
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    generated_at: String,
    kind: EntityKind,
    title: &'a str,
    #[serde(flatten)]
    report: &'a BatchReport,
}

/// Write the batch report as pretty JSON
pub fn write_report(
    entity: &CatalogEntity,
    report: &BatchReport,
    path: &Path,
) -> Result<(), OutputError> {
    let file = ReportFile {
        generated_at: Utc::now().to_rfc3339(),
        kind: entity.kind,
        title: &entity.title,
        report,
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json).map_err(io_error(path))?;
    tracing::info!(path = ?path, "Wrote report");
    Ok(())
}
