//! Regex search over a built index.
//!
//! Queries are always regular expressions with "occurs within the value"
//! semantics: `Taiwan` matches `Asia, China, Han, Taiwan`, and `A|B` is an OR.
//! Anchor explicitly (`^3/8$`) for whole-value matches.

use crate::error::{CorpusError, Result};
use crate::index::metadata_index::MetadataIndex;
use crate::metadata::Field;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// One matching bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub source_path: String,
    pub number: Option<String>,
}

/// Matches in `(source_path, number)` order plus query bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub matches: Vec<SearchMatch>,
    pub total_count: usize,
    pub query_time_ms: f64,
    pub query: String,
    /// Field searched; `None` means the default text fields.
    pub field: Option<Field>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// `(source_path, number)` pairs, handy for comparisons.
    pub fn pairs(&self) -> Vec<(String, Option<String>)> {
        self.matches
            .iter()
            .map(|m| (m.source_path.clone(), m.number.clone()))
            .collect()
    }
}

/// Compile a query, surfacing malformed patterns as [`CorpusError::InvalidQuery`].
pub fn compile_query(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| CorpusError::InvalidQuery {
        pattern: pattern.to_string(),
        source,
    })
}

/// Executes queries against a [`MetadataIndex`].
pub struct SearchEngine<'a> {
    index: &'a MetadataIndex,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a MetadataIndex) -> Self {
        Self { index }
    }

    /// Search one field, or title and composer when `field` is `None`.
    ///
    /// A bundle appears at most once however many of its values match.
    pub fn search(&self, pattern: &str, field: Option<Field>) -> Result<SearchResult> {
        let start = Instant::now();
        let regex = compile_query(pattern)?;

        let fields: &[Field] = match &field {
            Some(field) => std::slice::from_ref(field),
            None => &Field::DEFAULT_TEXT,
        };

        let mut hits = vec![false; self.index.len()];
        for field in fields {
            let Some(postings) = self.index.postings(*field) else {
                continue;
            };
            for (value, ids) in postings.iter() {
                if regex.is_match(value) {
                    for &id in ids {
                        hits[id] = true;
                    }
                }
            }
        }

        let matches: Vec<SearchMatch> = self
            .index
            .bundles()
            .iter()
            .zip(hits)
            .filter(|(_, hit)| *hit)
            .map(|(bundle, _)| SearchMatch {
                source_path: bundle.source_path.clone(),
                number: bundle.number.clone(),
            })
            .collect();

        let query_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "Search {:?} on {} matched {} bundles in {:.2}ms",
            pattern,
            field.map(|f| f.as_str()).unwrap_or("title|composer"),
            matches.len(),
            query_time_ms
        );

        Ok(SearchResult {
            total_count: matches.len(),
            matches,
            query_time_ms,
            query: pattern.to_string(),
            field,
        })
    }
}
