//! Picks the search result to download for a catalog track.
//!
//! Candidates are scanned in the order the search engine returned them and
//! the first one that clears every threshold wins, even if a later candidate
//! would score higher. The engine's own relevance ranking is the tie-break.

use serde::{Deserialize, Serialize};

use super::similarity::{self, MatchScore};
use crate::model::{CandidateResult, CatalogTrack};

/// Acceptance thresholds for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum title similarity (0-100)
    pub title_threshold: f64,
    /// Minimum artist similarity (0-100)
    pub artist_threshold: f64,
    /// Maximum duration difference in seconds
    pub duration_tolerance_secs: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            title_threshold: 70.0,
            artist_threshold: 70.0,
            duration_tolerance_secs: 10.0,
        }
    }
}

impl MatchConfig {
    /// Whether a score clears every threshold.
    pub fn accepts(&self, score: &MatchScore) -> bool {
        score.title_similarity >= self.title_threshold
            && score.artist_similarity >= self.artist_threshold
            && score.duration_delta_seconds <= self.duration_tolerance_secs
    }
}

/// Result of matching one catalog track against its search results.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// First candidate that cleared every threshold
    Accepted(CandidateResult),
    /// Nothing qualified; the closest candidate is kept for diagnostics
    NoConfidentMatch {
        best: CandidateResult,
        score: MatchScore,
        track: CatalogTrack,
    },
    /// The search returned nothing
    NoCandidates,
}

/// Applies the similarity model and thresholds to a candidate list.
#[derive(Debug, Clone, Default)]
pub struct MatchSelector {
    config: MatchConfig,
}

impl MatchSelector {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Select a candidate for `track`.
    pub fn select(&self, track: &CatalogTrack, candidates: &[CandidateResult]) -> MatchOutcome {
        let mut best: Option<(&CandidateResult, MatchScore)> = None;

        for candidate in candidates {
            let score = similarity::score(track, candidate);

            if self.config.accepts(&score) {
                tracing::debug!(
                    track = %track.label(),
                    candidate = %candidate.title,
                    title = score.title_similarity,
                    artist = score.artist_similarity,
                    delta = score.duration_delta_seconds,
                    "Accepted candidate"
                );
                return MatchOutcome::Accepted(candidate.clone());
            }

            tracing::trace!(
                track = %track.label(),
                candidate = %candidate.title,
                title = score.title_similarity,
                artist = score.artist_similarity,
                delta = score.duration_delta_seconds,
                "Rejected candidate"
            );

            // Strictly greater, so the earliest candidate wins ties.
            let is_better = best
                .as_ref()
                .is_none_or(|(_, current)| score.combined() > current.combined());
            if is_better {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) => MatchOutcome::NoConfidentMatch {
                best: candidate.clone(),
                score,
                track: track.clone(),
            },
            None => MatchOutcome::NoCandidates,
        }
    }
}
