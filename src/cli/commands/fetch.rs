//! Download command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Runtime;

use super::{CredentialArgs, build_acquirer, build_catalog, print_ytdlp_install_instructions};
use crate::acquire::AcquisitionResult;
use crate::config::Config;
use crate::media::YtDlp;
use crate::output;
use crate::pipeline::{self, PipelineOptions};

/// Flags for `fetch` that override the config file
pub struct FetchArgs {
    pub output: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub archive: bool,
    pub report: Option<PathBuf>,
    pub ytdlp: Option<PathBuf>,
}

/// Download every track behind a Spotify URL
pub fn cmd_fetch(
    rt: &Runtime,
    config: &Config,
    url: &str,
    credentials: &CredentialArgs,
    args: &FetchArgs,
) -> anyhow::Result<()> {
    let catalog = build_catalog(config, credentials)?;
    let acquirer = Arc::new(build_acquirer(config, args.ytdlp.as_ref()));

    let program = args
        .ytdlp
        .clone()
        .unwrap_or_else(|| config.tools.ytdlp_path.clone());
    if !YtDlp::new(&program).is_available() {
        eprintln!("Error: {} not found.", program.display());
        print_ytdlp_install_instructions();
        anyhow::bail!("yt-dlp is required for downloading");
    }

    let options = PipelineOptions {
        output_root: args
            .output
            .clone()
            .unwrap_or_else(|| config.output.directory.clone()),
        concurrency: args.concurrency.unwrap_or(config.download.concurrency),
        archive: args.archive && config.output.archive,
    };

    let summary = rt
        .block_on(pipeline::download_entity(
            &catalog,
            acquirer,
            url,
            &options,
            |progress| {
                print!("\rDownloaded {}/{}", progress.completed, progress.total);
                let _ = std::io::stdout().flush();
            },
        ))
        .with_context(|| format!("Failed to download {}", url))?;
    println!();

    let report = &summary.report;
    println!(
        "\n{} '{}': {} downloaded, {} unmatched, {} failed ({:.1}s)",
        summary.entity.kind,
        summary.entity.title,
        report.succeeded,
        report.unmatched,
        report.failed,
        report.elapsed.as_secs_f64()
    );

    for result in &report.results {
        match result {
            AcquisitionResult::Success { path, warnings, .. } => {
                println!("  ✓ {}", path.display());
                for warning in warnings {
                    println!("      warning: {}", warning);
                }
            }
            AcquisitionResult::Unmatched(diagnostic) => {
                println!("  ? {}", diagnostic.track.label());
                match &diagnostic.best {
                    Some(best) => println!(
                        "      closest: \"{}\" (title {:.0}, artist {:.0}, Δ{:.0}s) {}",
                        best.candidate.title,
                        best.score.title_similarity,
                        best.score.artist_similarity,
                        best.score.duration_delta_seconds,
                        best.candidate.locator
                    ),
                    None => println!("      no search results"),
                }
            }
            AcquisitionResult::Failed { track, error } => {
                println!("  ✗ {}: {}", track.label(), error);
            }
        }
    }

    println!("\nFiles: {}", summary.destination.display());
    if let Some(archive) = &summary.archive {
        println!("Archive: {}", archive.display());
    }

    if let Some(path) = &args.report {
        output::write_report(&summary.entity, report, path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("Report: {}", path.display());
    }

    Ok(())
}
