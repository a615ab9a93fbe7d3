//! tunefetch - download Spotify tracks, albums and playlists as tagged audio.
//!
//! Each catalog track is matched against YouTube search results with a fuzzy
//! title/artist/duration model, downloaded through yt-dlp with bounded
//! concurrency, tagged, and the result folder is zipped.

pub mod acquire;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod matching;
pub mod media;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod tagging;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; RUST_LOG overrides the default
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("tunefetch=info"))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    cli::run_command(&args)
}
