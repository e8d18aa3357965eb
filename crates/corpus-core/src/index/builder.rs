//! Parallel index construction.
//!
//! Each catalog entry is read (or fetched), parsed and turned into bundles
//! independently; results come back in catalog order and are merged once.
//! Per-entry failures become [`SkippedEntry`] records. Cancellation is the
//! only thing that stops a build, and it discards everything extracted.

use crate::cancel::CancellationToken;
use crate::catalog::{StorageSource, VirtualCorpus, VirtualWork, WorkCatalog, WorkEntry, WorkLocation};
use crate::error::{CorpusError, Result};
use crate::index::metadata_index::{MetadataIndex, SkippedEntry};
use crate::metadata::{Field, MetadataBundle};
use crate::network::Fetcher;
use crate::parser::{ParsedScore, ParserRegistry, ScoreItem, ScoreSource};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How often (in entries) progress is logged.
const PROGRESS_EVERY: usize = 500;

/// What one entry contributed: its bundles, and a diagnostic if extraction failed.
struct EntryOutcome {
    bundles: Vec<MetadataBundle>,
    skipped: Option<SkippedEntry>,
}

/// Builds a [`MetadataIndex`] from a catalog.
pub struct IndexBuilder<'a> {
    catalog: &'a WorkCatalog,
    virtual_corpus: &'a VirtualCorpus,
    parsers: &'a ParserRegistry,
    storage: Arc<dyn StorageSource>,
    fetcher: Arc<dyn Fetcher>,
    workers: usize,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        catalog: &'a WorkCatalog,
        virtual_corpus: &'a VirtualCorpus,
        parsers: &'a ParserRegistry,
        storage: Arc<dyn StorageSource>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            catalog,
            virtual_corpus,
            parsers,
            storage,
            fetcher,
            workers: crate::config::IndexConfig::default_workers(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Run the build. Returns [`CorpusError::Cancelled`] if the token fires
    /// before the merge.
    pub async fn build(&self, token: &CancellationToken) -> Result<MetadataIndex> {
        let start = Instant::now();
        let total = self.catalog.len();
        let processed = AtomicUsize::new(0);

        info!(
            "Building metadata index over {} entries with {} workers",
            total, self.workers
        );

        // futures are created up front; `buffered` only polls `workers` at a time
        let pending: Vec<_> = self
            .catalog
            .entries()
            .iter()
            .map(|entry| self.process(entry, token, &processed, total))
            .collect();

        let outcomes: Vec<EntryOutcome> = stream::iter(pending)
            .buffered(self.workers)
            .try_collect()
            .await?;

        // entries still in flight when the token fired
        token.check()?;

        let mut bundles = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            bundles.extend(outcome.bundles);
            skipped.extend(outcome.skipped);
        }

        let index = MetadataIndex::new(bundles, skipped);
        info!(
            "Metadata index built: {} bundles, {} skipped entries in {:.2}s",
            index.len(),
            index.skipped().len(),
            start.elapsed().as_secs_f64()
        );
        Ok(index)
    }

    /// Process one entry. Only cancellation is returned as an error.
    async fn process(
        &self,
        entry: &WorkEntry,
        token: &CancellationToken,
        processed: &AtomicUsize,
        total: usize,
    ) -> Result<EntryOutcome> {
        token.check()?;

        let outcome = match self.extract(entry).await {
            Ok(bundles) => EntryOutcome {
                bundles,
                skipped: None,
            },
            Err(e) if !e.is_per_entry() => return Err(e),
            Err(e) => self.fallback(entry, e),
        };

        let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_EVERY == 0 {
            info!("Indexed {}/{} entries", done, total);
        }
        Ok(outcome)
    }

    /// Record a failed entry. A registered virtual work is still indexed
    /// under its registered composer, title and number.
    fn fallback(&self, entry: &WorkEntry, error: CorpusError) -> EntryOutcome {
        let skipped = SkippedEntry {
            source_path: entry.source_path.clone(),
            reason: error.to_string(),
            retryable: error.is_retryable(),
        };

        let registered = if entry.is_virtual() {
            self.virtual_corpus.lookup(entry)
        } else {
            None
        };

        match registered {
            Some(work) => {
                warn!(
                    "Indexing registered metadata only for {}: {}",
                    entry.source_path, error
                );
                EntryOutcome {
                    bundles: vec![registered_bundle(entry, work)],
                    skipped: Some(skipped),
                }
            }
            None => {
                warn!("Skipping {}: {}", entry.source_path, error);
                EntryOutcome {
                    bundles: Vec::new(),
                    skipped: Some(skipped),
                }
            }
        }
    }

    async fn extract(&self, entry: &WorkEntry) -> Result<Vec<MetadataBundle>> {
        let parser = self
            .parsers
            .get(&entry.extension)
            .ok_or_else(|| CorpusError::UnsupportedFormat {
                extension: entry.extension.clone(),
            })?;

        let source_path = entry.source_path.clone();
        let extension = entry.extension.clone();

        let parsed: ParsedScore = match &entry.location {
            WorkLocation::Local(path) => {
                let storage = Arc::clone(&self.storage);
                let path = path.clone();
                tokio::task::spawn_blocking(move || {
                    let bytes = storage.read(&path)?;
                    parser.parse(&ScoreSource::new(source_path, &extension, bytes))
                })
                .await
                .map_err(|e| CorpusError::Other(format!("Parse task failed: {}", e)))??
            }
            WorkLocation::Remote(url) => {
                let bytes = self.fetcher.fetch(url).await?;
                tokio::task::spawn_blocking(move || {
                    parser.parse(&ScoreSource::new(source_path, &extension, bytes))
                })
                .await
                .map_err(|e| CorpusError::Other(format!("Parse task failed: {}", e)))??
            }
        };

        let registered = if entry.is_virtual() {
            self.virtual_corpus.lookup(entry)
        } else {
            None
        };

        let bundles = bundles_for(entry, parsed, registered);
        if bundles.is_empty() {
            return Err(CorpusError::parse(
                &entry.source_path,
                match &entry.number {
                    Some(n) => format!("item {} not found", n),
                    None => "no items found".to_string(),
                },
            ));
        }

        debug!("{}: {} bundles", entry.source_path, bundles.len());
        Ok(bundles)
    }
}

/// Turn parsed items into bundles for an entry.
///
/// An entry that names an item number keeps only that item. Registered
/// virtual composer and title go first in their fields.
fn bundles_for(
    entry: &WorkEntry,
    parsed: ParsedScore,
    registered: Option<&VirtualWork>,
) -> Vec<MetadataBundle> {
    parsed
        .items
        .into_iter()
        .filter(|item| entry.number.is_none() || item.number == entry.number)
        .map(|item| {
            let number = entry.number.clone().or_else(|| item.number.clone());
            let mut bundle = MetadataBundle::new(&entry.source_path, number);

            if let Some(work) = registered {
                bundle.push_value(Field::Composer, &work.composer);
                if let Some(title) = &work.title {
                    bundle.push_value(Field::Title, title);
                }
            }

            fill_bundle(&mut bundle, item);
            bundle
        })
        .collect()
}

/// Bundle carrying only what a virtual work was registered with.
fn registered_bundle(entry: &WorkEntry, work: &VirtualWork) -> MetadataBundle {
    let mut bundle = MetadataBundle::new(&entry.source_path, entry.number.clone());
    bundle.push_value(Field::Composer, &work.composer);
    if let Some(title) = &work.title {
        bundle.push_value(Field::Title, title);
    }
    bundle
}

fn fill_bundle(bundle: &mut MetadataBundle, item: ScoreItem) {
    for title in item.titles {
        bundle.push_value(Field::Title, title);
    }
    for composer in item.composers {
        bundle.push_value(Field::Composer, composer);
    }
    for locale in item.locales {
        bundle.push_value(Field::Locale, locale);
    }
    for ts in item.time_signatures {
        bundle.push_value(Field::TimeSignature, ts.to_string());
    }
    if let Some(key) = item.key_signature {
        bundle.push_value(Field::KeySignature, key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{KeySignature, TimeSignature};
    use std::path::PathBuf;

    fn entry(number: Option<&str>) -> WorkEntry {
        WorkEntry {
            collection: "misc".into(),
            source_path: "http://example.org/tunes.abc".into(),
            corpus_path: "misc/tunes".into(),
            work: "misc/tunes".into(),
            movement: None,
            extension: "abc".into(),
            location: WorkLocation::Local(PathBuf::from("/unused")),
            number: number.map(str::to_string),
        }
    }

    fn parsed() -> ParsedScore {
        let mut first = ScoreItem::numbered(Some("1".into()));
        first.titles.push("First".into());
        first.key_signature = KeySignature::from_abc("D");
        first.add_time_signature(TimeSignature::new(6, 8));

        let mut second = ScoreItem::numbered(Some("2".into()));
        second.composers.push("Anon".into());

        ParsedScore {
            items: vec![first, second],
        }
    }

    #[test]
    fn test_one_bundle_per_item() {
        let bundles = bundles_for(&entry(None), parsed(), None);
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].number.as_deref(), Some("1"));
        assert_eq!(bundles[0].first(Field::KeySignature), Some("2 sharps, mode major"));
        assert_eq!(bundles[0].first(Field::TimeSignature), Some("6/8"));
        assert_eq!(bundles[1].first(Field::Composer), Some("Anon"));
    }

    #[test]
    fn test_numbered_entry_keeps_its_item() {
        let bundles = bundles_for(&entry(Some("2")), parsed(), None);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].number.as_deref(), Some("2"));

        assert!(bundles_for(&entry(Some("9")), parsed(), None).is_empty());
    }

    #[test]
    fn test_registered_bundle_without_source() {
        let work = VirtualWork::new("misc/tunes", "http://example.org/tunes.abc", "Trad.")
            .unwrap()
            .with_title("Collected Tunes")
            .with_number("2");

        let bundle = registered_bundle(&entry(Some("2")), &work);
        assert_eq!(bundle.number.as_deref(), Some("2"));
        assert_eq!(bundle.values(Field::Composer), ["Trad."]);
        assert_eq!(bundle.values(Field::Title), ["Collected Tunes"]);
        assert!(!bundle.has(Field::KeySignature));
    }

    #[test]
    fn test_registered_metadata_is_merged() {
        let work = VirtualWork::new("misc/tunes", "http://example.org/tunes.abc", "Trad.")
            .unwrap()
            .with_title("Collected Tunes");

        let bundles = bundles_for(&entry(Some("2")), parsed(), Some(&work));
        assert_eq!(bundles[0].values(Field::Composer), ["Trad.", "Anon"]);
        assert_eq!(bundles[0].values(Field::Title), ["Collected Tunes"]);
    }
}
