//! Read-only commands: catalog listing and match preview.

use anyhow::Context;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use super::{CredentialArgs, build_acquirer, build_catalog};
use crate::catalog::CatalogProvider;
use crate::config::Config;
use crate::matching::MatchOutcome;

/// Print the tracks behind a Spotify URL
pub fn cmd_inspect(
    rt: &Runtime,
    config: &Config,
    url: &str,
    credentials: &CredentialArgs,
) -> anyhow::Result<()> {
    let catalog = build_catalog(config, credentials)?;
    let entity = rt
        .block_on(catalog.fetch_entity(url))
        .with_context(|| format!("Failed to resolve {}", url))?;

    println!("{} '{}' ({} tracks)\n", entity.kind, entity.title, entity.tracks.len());
    for (i, track) in entity.tracks.iter().enumerate() {
        let minutes = (track.duration_seconds / 60.0).floor();
        let seconds = track.duration_seconds - minutes * 60.0;
        let artists: Vec<&str> = track.artists.iter().map(|a| a.name.as_str()).collect();
        println!(
            "{:3}. {} - {} [{:.0}:{:02.0}] ({})",
            i + 1,
            artists.join(", "),
            track.name,
            minutes,
            seconds.floor(),
            track.album_name
        );
    }
    Ok(())
}

/// Search for every track and show the match decision, without downloading
pub fn cmd_match(
    rt: &Runtime,
    config: &Config,
    url: &str,
    credentials: &CredentialArgs,
    ytdlp: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let catalog = build_catalog(config, credentials)?;
    let acquirer = build_acquirer(config, ytdlp);

    rt.block_on(async {
        let entity = catalog
            .fetch_entity(url)
            .await
            .with_context(|| format!("Failed to resolve {}", url))?;
        println!("{} '{}' ({} tracks)\n", entity.kind, entity.title, entity.tracks.len());

        let mut accepted = 0;
        for track in &entity.tracks {
            match acquirer.preview(track).await {
                Ok(MatchOutcome::Accepted(candidate)) => {
                    accepted += 1;
                    println!("✓ {}", track.label());
                    println!("    → {} ({})", candidate.title, candidate.locator);
                }
                Ok(MatchOutcome::NoConfidentMatch { best, score, .. }) => {
                    println!("? {}", track.label());
                    println!(
                        "    closest: {} (title {:.0}, artist {:.0}, Δ{:.0}s)",
                        best.title,
                        score.title_similarity,
                        score.artist_similarity,
                        score.duration_delta_seconds
                    );
                }
                Ok(MatchOutcome::NoCandidates) => {
                    println!("? {}", track.label());
                    println!("    no search results");
                }
                Err(e) => println!("✗ {}: {}", track.label(), e),
            }
        }

        println!("\n{}/{} tracks would be downloaded", accepted, entity.tracks.len());
        Ok::<(), anyhow::Error>(())
    })
}
