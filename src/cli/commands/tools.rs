//! Environment checks and config setup.

use anyhow::Context;
use std::path::{Path, PathBuf};

use super::print_ytdlp_install_instructions;
use crate::config::{self, Config};
use crate::media::{YtDlp, ytdlp::tool_version};

/// Check if yt-dlp, ffmpeg and credentials are available
pub fn cmd_check_tools(config: &Config, ytdlp: Option<&PathBuf>) -> anyhow::Result<()> {
    println!("Checking download tools...\n");

    let program = ytdlp.cloned().unwrap_or_else(|| config.tools.ytdlp_path.clone());
    let ytdlp_ok = match YtDlp::new(&program).version() {
        Some(version) => {
            println!("✓ yt-dlp: {} ({})", version, program.display());
            true
        }
        None => {
            println!("✗ yt-dlp: NOT FOUND ({})", program.display());
            false
        }
    };

    let ffmpeg_ok = match tool_version(Path::new("ffmpeg"), "-version") {
        Some(version) => {
            println!("✓ ffmpeg: {}", version);
            true
        }
        None => {
            println!("✗ ffmpeg: NOT FOUND (needed for audio extraction)");
            false
        }
    };

    if !ytdlp_ok || !ffmpeg_ok {
        print_ytdlp_install_instructions();
    }

    println!();
    println!("Credentials:");
    let (client_id, client_secret) = config.credentials.resolve(
        std::env::var("SPOTIFY_CLIENT_ID").ok().as_deref(),
        std::env::var("SPOTIFY_CLIENT_SECRET").ok().as_deref(),
    );
    for (name, value) in [
        ("SPOTIFY_CLIENT_ID", client_id),
        ("SPOTIFY_CLIENT_SECRET", client_secret),
    ] {
        if value.is_some() {
            println!("✓ {}: set", name);
        } else {
            println!("✗ {}: not set", name);
        }
    }
    if config.credentials.spotify_client_id.is_none() {
        println!("  Get one at: https://developer.spotify.com/dashboard");
    }

    Ok(())
}

/// Write the default config file
pub fn cmd_init_config(path: Option<&PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.clone(),
        None => config::config_path().context("Could not determine config directory")?,
    };

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    config::save_to(&Config::default(), &path)
        .with_context(|| format!("Failed to write {:?}", path))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
