//! The universe of works: scanned local files plus registered virtual works.

use crate::catalog::collection::Collection;
use crate::catalog::entry::WorkEntry;
use crate::catalog::scanner::{describe_local_file, StorageSource};
use crate::catalog::virtual_corpus::VirtualCorpus;
use crate::config::CorpusConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Catalog of every work entry eligible for resolution and indexing.
///
/// Entry order is the catalog order used throughout: collections in
/// registration order, files in scan order within each collection, then
/// virtual works in registration order.
#[derive(Debug, Clone)]
pub struct WorkCatalog {
    corpus_root: PathBuf,
    collections: Vec<Collection>,
    entries: Vec<WorkEntry>,
}

impl WorkCatalog {
    /// Scan every collection root and append the virtual works.
    pub fn scan(
        corpus_root: &Path,
        collections: Vec<Collection>,
        virtual_corpus: &VirtualCorpus,
        storage: &dyn StorageSource,
    ) -> Result<Self> {
        let mut entries = Vec::new();

        for collection in &collections {
            let root = collection.storage_root(corpus_root);
            let files = storage.list_files(&root, CorpusConfig::SUPPORTED_EXTENSIONS)?;
            debug!("Collection {}: {} files", collection.name, files.len());

            entries.extend(files.into_iter().filter_map(|relative| {
                let location = root.join(&relative);
                describe_local_file(&collection.name, &relative, location)
            }));
        }

        let local_count = entries.len();
        entries.extend(virtual_corpus.entries());

        info!(
            "Catalogued {} local and {} virtual entries across {} collections",
            local_count,
            entries.len() - local_count,
            collections.len()
        );

        Ok(Self {
            corpus_root: corpus_root.to_path_buf(),
            collections,
            entries,
        })
    }

    /// Build a catalog from already-described entries, keeping their order.
    pub fn from_entries(
        corpus_root: impl Into<PathBuf>,
        collections: Vec<Collection>,
        entries: Vec<WorkEntry>,
    ) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            collections,
            entries,
        }
    }

    pub fn corpus_root(&self) -> &Path {
        &self.corpus_root
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> &[WorkEntry] {
        &self.entries
    }

    pub fn local_entries(&self) -> impl Iterator<Item = &WorkEntry> + '_ {
        self.entries.iter().filter(|e| !e.is_virtual())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
