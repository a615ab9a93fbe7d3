//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `fetch`: Download a track, album or playlist
//! - `inspect`: Show catalog contents and preview match decisions
//! - `tools`: Tool checks and config file setup

mod fetch;
mod inspect;
mod tools;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::acquire::TrackAcquirer;
use crate::catalog::SpotifyClient;
use crate::config::{self, Config};
use crate::matching::MatchSelector;
use crate::media::YtDlp;
use crate::tagging::LoftyTagSink;

pub use fetch::cmd_fetch;
pub use inspect::{cmd_inspect, cmd_match};
pub use tools::{cmd_check_tools, cmd_init_config};

/// tunefetch CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Spotify application credentials
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// Spotify client ID (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,
    /// Spotify client secret (overrides the config file)
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Download a Spotify track, album or playlist as tagged audio files
    Fetch {
        /// Spotify URL (https://open.spotify.com/{track|album|playlist}/...)
        url: String,
        #[command(flatten)]
        credentials: CredentialArgs,
        /// Parent directory for the download folder
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of tracks downloaded at the same time
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
        /// Keep the folder but skip the zip archive
        #[arg(long)]
        no_archive: bool,
        /// Write a JSON report of every track's outcome
        #[arg(long)]
        report: Option<PathBuf>,
        /// Path to the yt-dlp executable
        #[arg(long)]
        ytdlp: Option<PathBuf>,
    },
    /// List the tracks of a Spotify URL without downloading
    Inspect {
        url: String,
        #[command(flatten)]
        credentials: CredentialArgs,
    },
    /// Search for every track and show which result would be downloaded
    Match {
        url: String,
        #[command(flatten)]
        credentials: CredentialArgs,
        /// Path to the yt-dlp executable
        #[arg(long)]
        ytdlp: Option<PathBuf>,
    },
    /// Check that yt-dlp and ffmpeg are installed
    CheckTools {
        /// Path to the yt-dlp executable
        #[arg(long)]
        ytdlp: Option<PathBuf>,
    },
    /// Write a config file with the default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    match &cli.command {
        Commands::Fetch {
            url,
            credentials,
            output,
            concurrency,
            no_archive,
            report,
            ytdlp,
        } => {
            let rt = Runtime::new()?;
            let options = fetch::FetchArgs {
                output: output.clone(),
                concurrency: *concurrency,
                archive: !*no_archive,
                report: report.clone(),
                ytdlp: ytdlp.clone(),
            };
            cmd_fetch(&rt, &config, url, credentials, &options)
        }
        Commands::Inspect { url, credentials } => {
            let rt = Runtime::new()?;
            cmd_inspect(&rt, &config, url, credentials)
        }
        Commands::Match {
            url,
            credentials,
            ytdlp,
        } => {
            let rt = Runtime::new()?;
            cmd_match(&rt, &config, url, credentials, ytdlp.as_ref())
        }
        Commands::CheckTools { ytdlp } => cmd_check_tools(&config, ytdlp.as_ref()),
        Commands::InitConfig { force } => cmd_init_config(cli.config.as_ref(), *force),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Build a catalog client from flags, environment and config file
pub(crate) fn build_catalog(
    config: &Config,
    credentials: &CredentialArgs,
) -> anyhow::Result<SpotifyClient> {
    let (client_id, client_secret) = config.credentials.resolve(
        credentials.client_id.as_deref(),
        credentials.client_secret.as_deref(),
    );
    let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
        print_credentials_instructions();
        anyhow::bail!("Spotify credentials are not configured");
    };
    SpotifyClient::new(client_id, client_secret).context("Failed to create Spotify client")
}

/// Build the acquirer wired to yt-dlp and lofty
pub(crate) fn build_acquirer(config: &Config, ytdlp: Option<&PathBuf>) -> TrackAcquirer {
    let program = ytdlp.cloned().unwrap_or_else(|| config.tools.ytdlp_path.clone());
    let ytdlp = Arc::new(YtDlp::new(program));

    TrackAcquirer::new(
        ytdlp.clone(),
        ytdlp,
        Arc::new(LoftyTagSink::default()),
        MatchSelector::new(config.matching),
        config.download.acquire_config(),
    )
}

/// Print installation instructions for yt-dlp and ffmpeg
pub(crate) fn print_ytdlp_install_instructions() {
    eprintln!("Install yt-dlp and ffmpeg:");
    eprintln!("  Windows: winget install yt-dlp.yt-dlp Gyan.FFmpeg");
    eprintln!("  macOS:   brew install yt-dlp ffmpeg");
    eprintln!("  Linux:   pipx install yt-dlp && apt install ffmpeg");
}

fn print_credentials_instructions() {
    eprintln!("Error: Spotify credentials not found.");
    eprintln!("Create an app at https://developer.spotify.com/dashboard, then either:");
    eprintln!("  set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET, or");
    eprintln!("  add them to the [credentials] section of the config file (see `tunefetch init-config`)");
}
