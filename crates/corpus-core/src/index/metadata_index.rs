//! The built, read-only metadata index.

use crate::metadata::{Field, MetadataBundle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An entry the build could not extract.
///
/// A virtual work keeps a bundle of its registered metadata even when it is
/// recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub source_path: String,
    pub reason: String,
    /// The failure was transient, so a later build may succeed.
    #[serde(default)]
    pub retryable: bool,
}

/// Distinct values of one field, each with the bundles that carry it.
///
/// A query regex runs once per distinct value rather than once per bundle.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldPostings {
    values: Vec<(String, Vec<usize>)>,
}

impl FieldPostings {
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.values
            .iter()
            .map(|(value, ids)| (value.as_str(), ids.as_slice()))
    }

    pub(crate) fn distinct_values(&self) -> usize {
        self.values.len()
    }
}

/// Every bundle in `(source_path, number)` order plus per-field postings.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    bundles: Vec<MetadataBundle>,
    postings: HashMap<Field, FieldPostings>,
    skipped: Vec<SkippedEntry>,
}

impl MetadataIndex {
    /// Build from bundles in catalog order. Ties on `(source_path, number)`
    /// keep that order.
    pub fn new(mut bundles: Vec<MetadataBundle>, skipped: Vec<SkippedEntry>) -> Self {
        bundles.sort_by(MetadataBundle::cmp_position);

        let mut postings: HashMap<Field, FieldPostings> = HashMap::new();
        for field in Field::ALL {
            let mut slots: HashMap<&str, usize> = HashMap::new();
            let mut table = FieldPostings::default();

            for (id, bundle) in bundles.iter().enumerate() {
                for value in bundle.values(field) {
                    let slot = *slots.entry(value.as_str()).or_insert_with(|| {
                        table.values.push((value.clone(), Vec::new()));
                        table.values.len() - 1
                    });
                    table.values[slot].1.push(id);
                }
            }

            postings.insert(field, table);
        }

        Self {
            bundles,
            postings,
            skipped,
        }
    }

    pub fn bundles(&self) -> &[MetadataBundle] {
        &self.bundles
    }

    pub fn bundle(&self, id: usize) -> Option<&MetadataBundle> {
        self.bundles.get(id)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Entries the build skipped, with the reason.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Whether any skip was transient (a network failure or timeout).
    pub fn has_retryable_skips(&self) -> bool {
        self.skipped.iter().any(|s| s.retryable)
    }

    /// Number of distinct values stored for a field.
    pub fn distinct_values(&self, field: Field) -> usize {
        self.postings
            .get(&field)
            .map(FieldPostings::distinct_values)
            .unwrap_or(0)
    }

    pub(crate) fn postings(&self, field: Field) -> Option<&FieldPostings> {
        self.postings.get(&field)
    }
}
