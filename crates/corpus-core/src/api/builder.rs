//! Builder for configuring Corpus initialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::api::state::{BuildStatus, CorpusState};
use crate::catalog::{
    default_collections, Collection, FileSystemStorage, StorageSource, VirtualCorpus, VirtualWork,
    WorkCatalog,
};
use crate::config::IndexConfig;
use crate::error::{CorpusError, Result};
use crate::index::IndexCache;
use crate::network::{Fetcher, HttpFetcher};
use crate::parser::{ParserRegistry, ScoreParser};
use crate::Corpus;

/// Builder for configuring Corpus initialization.
///
/// # Example
///
/// ```rust,ignore
/// use corpus_core::{Collection, Corpus};
///
/// let corpus = Corpus::builder("./corpus")
///     .collections(vec![Collection::new("essenFolksong")])
///     .workers(8)
///     .cache_enabled(false)
///     .build()
///     .await?;
/// ```
pub struct CorpusBuilder {
    corpus_root: PathBuf,
    collections: Vec<Collection>,
    virtual_corpus: VirtualCorpus,
    parsers: ParserRegistry,
    storage: Arc<dyn StorageSource>,
    fetcher: Option<Arc<dyn Fetcher>>,
    workers: usize,
    cache_dir: Option<PathBuf>,
    cache_enabled: bool,
}

impl CorpusBuilder {
    /// Create a builder over a corpus root directory.
    ///
    /// Defaults: the standard collections, the built-in virtual works, the
    /// ABC and MusicXML parsers, an HTTP fetcher and a cache under the user
    /// cache directory.
    pub fn new(corpus_root: impl Into<PathBuf>) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            collections: default_collections(),
            virtual_corpus: VirtualCorpus::with_defaults(),
            parsers: ParserRegistry::with_defaults(),
            storage: Arc::new(FileSystemStorage),
            fetcher: None,
            workers: IndexConfig::default_workers(),
            cache_dir: dirs::cache_dir().map(|dir| dir.join(IndexConfig::CACHE_DIR_NAME)),
            cache_enabled: true,
        }
    }

    /// Replace the collection list. Catalog order follows this order.
    pub fn collections(mut self, collections: Vec<Collection>) -> Self {
        self.collections = collections;
        self
    }

    /// Add a collection, replacing one with the same name.
    pub fn add_collection(mut self, collection: Collection) -> Self {
        match self.collections.iter_mut().find(|c| c.name == collection.name) {
            Some(existing) => *existing = collection,
            None => self.collections.push(collection),
        }
        self
    }

    /// Replace the virtual work registry.
    pub fn virtual_corpus(mut self, virtual_corpus: VirtualCorpus) -> Self {
        self.virtual_corpus = virtual_corpus;
        self
    }

    pub fn register_virtual_work(mut self, work: VirtualWork) -> Self {
        self.virtual_corpus.register(work);
        self
    }

    /// Replace the parser registry.
    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn register_parser(mut self, parser: Arc<dyn ScoreParser>) -> Self {
        self.parsers.register(parser);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn StorageSource>) -> Self {
        self.storage = storage;
        self
    }

    /// Fetcher for virtual works. Default: [`HttpFetcher`].
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Number of entries parsed concurrently during a build.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Directory that holds index snapshots.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Enable or disable the index snapshot cache.
    ///
    /// Default: `true`
    pub fn cache_enabled(mut self, enable: bool) -> Self {
        self.cache_enabled = enable;
        self
    }

    /// Scan the corpus and build the Corpus instance. The metadata index is
    /// not built until first searched.
    pub async fn build(self) -> Result<Corpus> {
        if !self.corpus_root.is_dir() {
            return Err(CorpusError::Config {
                message: format!("Corpus root does not exist: {}", self.corpus_root.display()),
            });
        }

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()?),
        };

        let cache = match (&self.cache_dir, self.cache_enabled) {
            (Some(dir), true) => Some(IndexCache::in_dir(&dir.join(root_key(&self.corpus_root)))),
            _ => None,
        };
        debug!(
            "Index cache: {}",
            cache
                .as_ref()
                .map(|c| c.path().display().to_string())
                .unwrap_or_else(|| "disabled".to_string())
        );

        let catalog = {
            let root = self.corpus_root.clone();
            let collections = self.collections;
            let virtual_corpus = self.virtual_corpus.clone();
            let storage = Arc::clone(&self.storage);
            tokio::task::spawn_blocking(move || {
                WorkCatalog::scan(&root, collections, &virtual_corpus, storage.as_ref())
            })
            .await
            .map_err(|e| CorpusError::Other(format!("Catalog scan task failed: {}", e)))??
        };

        let state = CorpusState {
            catalog,
            virtual_corpus: self.virtual_corpus,
            parsers: self.parsers,
            storage: self.storage,
            fetcher,
            workers: self.workers,
            cache,
            index: RwLock::new(None),
            status: RwLock::new(BuildStatus::Idle),
            build_lock: Mutex::new(()),
        };

        Ok(Corpus {
            state: Arc::new(state),
        })
    }
}

/// Stable per-root subdirectory name, so corpora never share a snapshot.
fn root_key(root: &Path) -> String {
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_root_is_config_error() {
        let temp = TempDir::new().unwrap();
        let result = CorpusBuilder::new(temp.path().join("missing"))
            .cache_enabled(false)
            .build()
            .await;
        assert!(matches!(result, Err(CorpusError::Config { .. })));
    }

    #[test]
    fn test_add_collection_replaces_by_name() {
        let builder = CorpusBuilder::new("/corpus")
            .collections(vec![Collection::new("bach")])
            .add_collection(Collection::new("bach").with_alias("bwv"))
            .add_collection(Collection::new("josquin"));

        assert_eq!(builder.collections.len(), 2);
        assert_eq!(builder.collections[0].aliases, vec!["bwv".to_string()]);
    }

    #[test]
    fn test_root_key_is_stable() {
        let temp = TempDir::new().unwrap();
        assert_eq!(root_key(temp.path()), root_key(temp.path()));
        assert_eq!(root_key(temp.path()).len(), 16);
    }
}
