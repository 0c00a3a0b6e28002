//! Lexical code lookup over the code catalogue.
//!
//! Matching is two-pass and purely lexical:
//!
//! 1. **Condition pass**: a condition name matches when it contains the query or the query
//!    contains it (both lower-cased). All of its records are taken, tagged with the condition name.
//! 2. **Symptom pass**: a symptom phrase matches when it contains the query, the query contains
//!    it, or any word of the phrase longer than three characters appears in the query. Records
//!    whose code is already in the result are skipped.
//!
//! The combined result is deduplicated by code (first occurrence wins) and capped at
//! [`SEARCH_RESULT_LIMIT`]. The cap is lossy: [`SearchResults::total_matches`] reports how many
//! distinct codes matched before it was applied.
//!
//! An empty query matches nothing. Without that guard, the empty string would be a substring of
//! every condition name and return the whole catalogue.

use crate::codes::{CodeCatalogue, CodeRecord};
use crate::constants::{SEARCH_RESULT_LIMIT, SYMPTOM_WORD_MIN_EXCLUSIVE};
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Outcome of a search that ran against a loaded catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    query: String,
    records: Vec<CodeRecord>,
    total_matches: usize,
}

impl SearchResults {
    /// The query as the caller supplied it (not normalised).
    pub fn query(&self) -> &str {
        &self.query
    }

    /// At most [`SEARCH_RESULT_LIMIT`] records, deduplicated by code.
    pub fn records(&self) -> &[CodeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct matching codes before the display cap was applied.
    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    /// Whether matches were dropped by the display cap.
    pub fn truncated(&self) -> bool {
        self.total_matches > self.records.len()
    }

    /// The "no results" message for an empty result, echoing the raw query.
    pub fn no_results_message(&self) -> Option<String> {
        self.is_empty().then(|| no_results_message(&self.query))
    }
}

/// Message shown when a query produced no matches.
pub fn no_results_message(query: &str) -> String {
    format!("No results for \"{query}\" — try a different symptom or condition name")
}

#[derive(Clone, Debug)]
enum CatalogueSource {
    Loaded(CodeCatalogue),
    Unavailable(String),
}

/// Code search bound to a catalogue that may have failed to load.
///
/// A missing or malformed catalogue is kept as an explicit state so that every search reports
/// `CatalogueUnavailable` instead of an empty result.
#[derive(Clone, Debug)]
pub struct CodeSearch {
    source: CatalogueSource,
}

impl CodeSearch {
    pub fn new(catalogue: CodeCatalogue) -> Self {
        Self {
            source: CatalogueSource::Loaded(catalogue),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            source: CatalogueSource::Unavailable(reason.into()),
        }
    }

    /// Loads the catalogue at `path`, recording (and logging) a failure rather than returning it.
    pub fn load(path: &Path) -> Self {
        match CodeCatalogue::load(path) {
            Ok(catalogue) => {
                tracing::info!(
                    "loaded code catalogue from {} ({} records)",
                    path.display(),
                    catalogue.record_count()
                );
                Self::new(catalogue)
            }
            Err(e) => {
                tracing::warn!("code catalogue unavailable ({}): {}", path.display(), e);
                Self::unavailable(format!("{}: {}", path.display(), e))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.source, CatalogueSource::Loaded(_))
    }

    /// # Errors
    ///
    /// Returns `CoreError::CatalogueUnavailable` if the catalogue failed to load.
    pub fn catalogue(&self) -> CoreResult<&CodeCatalogue> {
        match &self.source {
            CatalogueSource::Loaded(catalogue) => Ok(catalogue),
            CatalogueSource::Unavailable(reason) => {
                Err(CoreError::CatalogueUnavailable(reason.clone()))
            }
        }
    }

    /// Runs a lexical search.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::CatalogueUnavailable` if the catalogue failed to load. An empty or
    /// unmatched query against a loaded catalogue is `Ok` with no records.
    pub fn search(&self, query: &str) -> CoreResult<SearchResults> {
        let catalogue = self.catalogue()?;

        let mut records = match_codes(catalogue, query);
        let total_matches = records.len();
        records.truncate(SEARCH_RESULT_LIMIT);

        tracing::debug!(
            total_matches,
            returned = records.len(),
            "code search for {:?}",
            query
        );

        Ok(SearchResults {
            query: query.to_string(),
            records,
            total_matches,
        })
    }
}

/// Every matching record, deduplicated by code, before the display cap.
pub fn match_codes(catalogue: &CodeCatalogue, query: &str) -> Vec<CodeRecord> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<CodeRecord> = Vec::new();

    for entry in catalogue.condition_entries() {
        let name = entry.key.to_lowercase();
        if name.contains(&normalized) || normalized.contains(&name) {
            results.extend(entry.records.iter().map(|record| CodeRecord {
                condition: Some(entry.key.clone()),
                ..record.clone()
            }));
        }
    }

    for entry in catalogue.symptom_entries() {
        if !symptom_matches(&entry.key.to_lowercase(), &normalized) {
            continue;
        }
        for record in &entry.records {
            if !results.iter().any(|r| r.code == record.code) {
                results.push(record.clone());
            }
        }
    }

    dedup_by_code(results)
}

/// Coarse phrase test: substring either way, or any long-enough word of the phrase in the query.
///
/// The word rule is deliberately loose; a common word (e.g. "vision") ties unrelated phrases
/// together.
fn symptom_matches(phrase: &str, query: &str) -> bool {
    phrase.contains(query)
        || query.contains(phrase)
        || phrase
            .split(' ')
            .any(|word| word.chars().count() > SYMPTOM_WORD_MIN_EXCLUSIVE && query.contains(word))
}

fn dedup_by_code(records: Vec<CodeRecord>) -> Vec<CodeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.code.clone()))
        .collect()
}
