//! The candidate source boundary and a static in-memory catalog.
//!
//! Production deployments put an external movie catalog behind
//! [`CandidateSource`]; [`StaticCatalog`] serves a fixed list, which is enough
//! for local use and tests.

use std::{collections::HashMap, future::Future, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, decision::ItemId};

/// A candidate item as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub id:           ItemId,
  pub title:        String,
  /// `YYYY-MM-DD` as reported by the catalog; may be missing or malformed.
  #[serde(default)]
  pub release_date: String,
  /// Average rating on a 0–10 scale.
  #[serde(default)]
  pub rating:       f64,
  #[serde(default)]
  pub genres:       Vec<String>,
  /// Streaming providers the item is available on.
  #[serde(default)]
  pub providers:    Vec<String>,
}

impl Candidate {
  /// Release year parsed from the leading `YYYY` of `release_date`.
  pub fn release_year(&self) -> Option<i32> {
    self.release_date.get(..4)?.parse().ok()
  }

  pub fn available_on_any(&self, providers: &[String]) -> bool {
    self.providers.iter().any(|p| providers.contains(p))
  }
}

/// Filters shared by candidate sourcing and the suggestion ranker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateFilter {
  #[serde(default)]
  pub genres:              Vec<String>,
  pub min_year:            Option<i32>,
  pub max_year:            Option<i32>,
  pub min_rating:          Option<f64>,
  #[serde(default)]
  pub providers:           Vec<String>,
  /// Exclude items not available on any of `providers`.
  #[serde(default)]
  pub strict_availability: bool,
}

impl CandidateFilter {
  /// Whether strict availability actually restricts anything.
  pub fn restricts_providers(&self) -> bool {
    self.strict_availability && !self.providers.is_empty()
  }

  pub fn accepts(&self, candidate: &Candidate) -> bool {
    if !self.genres.is_empty() && !candidate.genres.iter().any(|g| self.genres.contains(g)) {
      return false;
    }
    if self.min_year.is_some() || self.max_year.is_some() {
      let Some(year) = candidate.release_year() else { return false };
      if self.min_year.is_some_and(|min| year < min) || self.max_year.is_some_and(|max| year > max) {
        return false;
      }
    }
    if self.min_rating.is_some_and(|min| candidate.rating < min) {
      return false;
    }
    if self.restricts_providers() && !candidate.available_on_any(&self.providers) {
      return false;
    }
    true
  }
}

/// One page of candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePage {
  pub items:      Vec<Candidate>,
  /// Pass back to fetch the following page; `None` on the last page.
  pub next_token: Option<String>,
}

/// Source of candidate items to swipe on.
pub trait CandidateSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one page of items matching `filter`, starting at `token`.
  fn page<'a>(
    &'a self,
    filter: &'a CandidateFilter,
    token: Option<&'a str>,
  ) -> impl Future<Output = Result<CandidatePage, Self::Error>> + Send + 'a;

  /// Look up items by id; unknown ids are skipped.
  fn lookup<'a>(
    &'a self,
    ids: &'a [ItemId],
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + 'a;
}

// ─── StaticCatalog ───────────────────────────────────────────────────────────

/// A fixed catalog held in memory. Page tokens are decimal offsets.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
  items:     Vec<Candidate>,
  by_id:     HashMap<ItemId, usize>,
  page_size: usize,
}

impl StaticCatalog {
  pub const DEFAULT_PAGE_SIZE: usize = 20;

  pub fn new(items: Vec<Candidate>) -> Self {
    let by_id = items.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    Self { items, by_id, page_size: Self::DEFAULT_PAGE_SIZE }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  /// Load a JSON array of [`Candidate`]s.
  pub fn from_json_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    let items: Vec<Candidate> = serde_json::from_str(&raw)?;
    Ok(Self::new(items))
  }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl CandidateSource for StaticCatalog {
  type Error = Error;

  async fn page(
    &self,
    filter: &CandidateFilter,
    token: Option<&str>,
  ) -> Result<CandidatePage> {
    let offset = match token {
      None => 0,
      Some(t) => t.parse::<usize>().map_err(|_| Error::InvalidPageToken(t.to_owned()))?,
    };

    let mut matching = self.items.iter().filter(|c| filter.accepts(c)).skip(offset);
    let items: Vec<Candidate> = matching.by_ref().take(self.page_size).cloned().collect();
    let next_token = matching
      .next()
      .is_some()
      .then(|| (offset + items.len()).to_string());

    Ok(CandidatePage { items, next_token })
  }

  async fn lookup(&self, ids: &[ItemId]) -> Result<Vec<Candidate>> {
    Ok(
      ids
        .iter()
        .filter_map(|id| self.by_id.get(id).map(|&i| self.items[i].clone()))
        .collect(),
    )
  }
}
