//! Brute-force cosine ranking over stored embeddings.
//!
//! Also provides the random fallback used when an upload has no detectable
//! face, and the `[id, "0.1234"]` wire formatting of results.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Number of matches returned by the similarity endpoints and the CLI.
pub const TOP_K: usize = 5;

/// One ranked match: a stored identifier and its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f64,
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` if vectors have different
/// lengths, are empty, or either has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Rank `entries` by cosine similarity to `query` and keep the best `k`.
///
/// The result is sorted by descending score. Equal scores keep the order in
/// which `entries` yielded them.
pub fn rank_by_cosine<'a, I>(query: &[f32], entries: I, k: usize) -> Vec<ScoredMatch>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scored: Vec<ScoredMatch> = entries
        .into_iter()
        .map(|(id, embedding)| ScoredMatch {
            id: id.to_string(),
            score: cosine_similarity(query, embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Pick up to `k` random identifiers, each with a score of `0.0`.
pub fn fallback_matches<'a, I, R>(ids: I, k: usize, rng: &mut R) -> Vec<ScoredMatch>
where
    I: IntoIterator<Item = &'a str>,
    R: Rng + ?Sized,
{
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.shuffle(rng);
    ids.into_iter()
        .take(k)
        .map(|id| ScoredMatch {
            id: id.to_string(),
            score: 0.0,
        })
        .collect()
}

/// Render a score with four decimal places, e.g. `0.9132`.
pub fn format_score(score: f64) -> String {
    format!("{score:.4}")
}

/// Convert matches into `[id, score]` string pairs.
pub fn format_matches(matches: &[ScoredMatch]) -> Vec<[String; 2]> {
    matches
        .iter()
        .map(|m| [m.id.clone(), format_score(m.score)])
        .collect()
}
