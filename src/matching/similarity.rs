//! Textual and temporal similarity between a catalog track and a search result.
//!
//! Text similarity is a token-set ratio: both strings are split on whitespace,
//! deduplicated, and compared so that word order and extra words on one side
//! do not hurt the score. Scores are on a 0-100 scale.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{CandidateResult, CatalogTrack};

/// How closely a candidate resembles a catalog track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Token-set similarity of track name vs candidate title (0-100)
    pub title_similarity: f64,
    /// Best token-set similarity of any artist vs candidate title (0-100)
    pub artist_similarity: f64,
    /// Absolute duration difference in seconds
    pub duration_delta_seconds: f64,
}

impl MatchScore {
    /// Sum of the two textual scores, used to rank rejected candidates.
    pub fn combined(&self) -> f64 {
        self.title_similarity + self.artist_similarity
    }
}

/// Score a candidate against a catalog track.
pub fn score(track: &CatalogTrack, candidate: &CandidateResult) -> MatchScore {
    let title = candidate.title.to_lowercase();

    let title_similarity = token_set_ratio(&track.name.to_lowercase(), &title);

    // An artist may appear anywhere in a loosely formatted title, so any
    // credited artist counts.
    let artist_similarity = track
        .artists
        .iter()
        .map(|artist| token_set_ratio(&artist.name.to_lowercase(), &title))
        .fold(0.0, f64::max);

    let duration_delta_seconds = (track.duration_seconds - candidate.duration_seconds).abs();

    MatchScore {
        title_similarity,
        artist_similarity,
        duration_delta_seconds,
    }
}

/// Token-set similarity of two strings on a 0-100 scale.
///
/// Returns 100 when one token set is contained in the other, 0 when either
/// string has no tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    if !intersection.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    // BTreeSet iteration is sorted, so the joined strings are canonical.
    let diff_ab = only_a.join(" ");
    let diff_ba = only_b.join(" ");
    let ab_len = diff_ab.chars().count();
    let ba_len = diff_ba.chars().count();
    let sect_len = intersection.join(" ").chars().count();

    // Lengths of "sect + ab" and "sect + ba" including the joining space.
    let separator = usize::from(sect_len > 0);
    let sect_ab_len = sect_len + separator + ab_len;
    let sect_ba_len = sect_len + separator + ba_len;

    let distance = indel_distance(&diff_ab, &diff_ba);
    let mut result = normalized_similarity(distance, sect_ab_len + sect_ba_len);

    if sect_len == 0 {
        return result;
    }

    // Only the differing suffix contributes to these distances.
    let sect_ab_ratio = normalized_similarity(separator + ab_len, sect_len + sect_ab_len);
    let sect_ba_ratio = normalized_similarity(separator + ba_len, sect_len + sect_ba_len);

    result = result.max(sect_ab_ratio).max(sect_ba_ratio);
    result
}

fn normalized_similarity(distance: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        return 100.0;
    }
    100.0 * (1.0 - distance as f64 / total_len as f64)
}

/// Insertion/deletion edit distance: `len(a) + len(b) - 2 * LCS(a, b)`.
fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * longest_common_subsequence(&a, &b)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}
