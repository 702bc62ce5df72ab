//! "Tonight's pick": choose one unwatched match to suggest.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{catalog::{Candidate, CandidateFilter}, matches::Match};

const RATING_WEIGHT: f64 = 0.7;
const RECENCY_WEIGHT: f64 = 0.3;
const MAX_RATING: f64 = 10.0;
/// Release years mapped onto the 0–1 recency scale; clamped outside.
pub const RECENCY_MIN_YEAR: i32 = 1950;
pub const RECENCY_MAX_YEAR: i32 = 2025;
/// Scores closer than this are treated as a tie.
const TIE_EPSILON: f64 = 1e-9;

/// A match together with the catalog metadata needed to rank it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedItem {
  #[serde(rename = "match")]
  pub record: Match,
  pub item:   Candidate,
}

/// Weighted score in `[0, 1]`.
pub fn score(item: &Candidate) -> f64 {
  let rating = (item.rating / MAX_RATING).clamp(0.0, 1.0);
  let recency = item.release_year().map_or(0.0, |year| {
    let span = f64::from(RECENCY_MAX_YEAR - RECENCY_MIN_YEAR);
    (f64::from(year - RECENCY_MIN_YEAR) / span).clamp(0.0, 1.0)
  });
  rating * RATING_WEIGHT + recency * RECENCY_WEIGHT
}

/// Pick the best unwatched match, breaking ties uniformly at random.
pub fn suggest_best_pick<'a, R: Rng + ?Sized>(
  matches: &'a [MatchedItem],
  preferences: &CandidateFilter,
  rng: &mut R,
) -> Option<&'a MatchedItem> {
  let scored: Vec<(&MatchedItem, f64)> = matches
    .iter()
    .filter(|m| !m.record.watched)
    .filter(|m| {
      !preferences.restricts_providers() || m.item.available_on_any(&preferences.providers)
    })
    .map(|m| (m, score(&m.item)))
    .collect();

  let best = scored.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
  let tied: Vec<&MatchedItem> = scored
    .into_iter()
    .filter(|(_, s)| (best - s).abs() < TIE_EPSILON)
    .map(|(m, _)| m)
    .collect();

  tied.choose(rng).copied()
}
