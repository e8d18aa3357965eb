//! Shared corpus state and index build lifecycle.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::catalog::{StorageSource, VirtualCorpus, WorkCatalog};
use crate::error::{CorpusError, Result};
use crate::index::{fingerprint, IndexBuilder, IndexCache, MetadataIndex};
use crate::network::Fetcher;
use crate::parser::ParserRegistry;
use serde::{Deserialize, Serialize};

/// Where the most recent index build stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BuildStatus {
    /// No build has run yet.
    Idle,
    InProgress,
    Complete { bundles: usize, skipped: usize },
    Failed { message: String },
    Cancelled,
}

impl BuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, BuildStatus::InProgress)
    }
}

/// Everything a `Corpus` owns. Wrapped in `Arc` so background builds can
/// hold it past the caller's borrow.
pub(crate) struct CorpusState {
    pub(crate) catalog: WorkCatalog,
    pub(crate) virtual_corpus: VirtualCorpus,
    pub(crate) parsers: ParserRegistry,
    pub(crate) storage: Arc<dyn StorageSource>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) workers: usize,
    pub(crate) cache: Option<IndexCache>,
    pub(crate) index: RwLock<Option<Arc<MetadataIndex>>>,
    pub(crate) status: RwLock<BuildStatus>,
    /// Serializes builds so two callers never extract the same corpus at once.
    pub(crate) build_lock: Mutex<()>,
}

impl CorpusState {
    /// The current index, building it (or loading the cache) on first use.
    pub(crate) async fn ensure_index(&self) -> Result<Arc<MetadataIndex>> {
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        let _guard = self.build_lock.lock().await;
        // another caller may have finished while we waited
        if let Some(index) = self.index.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        self.run_build(&CancellationToken::new(), true).await
    }

    /// Build from scratch, ignoring any cached snapshot, and swap it in.
    pub(crate) async fn rebuild(&self, token: &CancellationToken) -> Result<Arc<MetadataIndex>> {
        let _guard = self.build_lock.lock().await;
        self.run_build(token, false).await
    }

    /// Caller holds `build_lock`.
    async fn run_build(&self, token: &CancellationToken, use_cache: bool) -> Result<Arc<MetadataIndex>> {
        *self.status.write().await = BuildStatus::InProgress;

        let fingerprint = fingerprint(
            &self.catalog,
            &self.virtual_corpus,
            &self.parsers,
            self.storage.as_ref(),
        );

        let cached = match (&self.cache, use_cache) {
            (Some(cache), true) => cache.load(&fingerprint),
            _ => None,
        };

        let result = match cached {
            Some(index) => Ok(index),
            None => {
                IndexBuilder::new(
                    &self.catalog,
                    &self.virtual_corpus,
                    &self.parsers,
                    Arc::clone(&self.storage),
                    Arc::clone(&self.fetcher),
                )
                .with_workers(self.workers)
                .build(token)
                .await
                .inspect(|index| self.store_cache(index, &fingerprint))
            }
        };

        match result {
            Ok(index) => {
                let index = Arc::new(index);
                *self.index.write().await = Some(Arc::clone(&index));
                *self.status.write().await = BuildStatus::Complete {
                    bundles: index.len(),
                    skipped: index.skipped().len(),
                };
                Ok(index)
            }
            Err(CorpusError::Cancelled) => {
                info!("Index build cancelled; keeping the previous index");
                *self.status.write().await = BuildStatus::Cancelled;
                Err(CorpusError::Cancelled)
            }
            Err(e) => {
                warn!("Index build failed: {}", e);
                *self.status.write().await = BuildStatus::Failed {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }

    fn store_cache(&self, index: &MetadataIndex, fingerprint: &str) {
        if let Some(cache) = &self.cache {
            // the fingerprint cannot see a remote host coming back
            if index.has_retryable_skips() {
                info!("Not caching an index with transient fetch failures");
                return;
            }
            if let Err(e) = cache.store(index, fingerprint) {
                warn!("Failed to write index cache {}: {}", cache.path().display(), e);
            }
        }
    }
}

/// A background index build started by `Corpus::spawn_rebuild`.
pub struct RebuildHandle {
    token: CancellationToken,
    task: JoinHandle<Result<Arc<MetadataIndex>>>,
}

impl RebuildHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<Result<Arc<MetadataIndex>>>) -> Self {
        Self { token, task }
    }

    /// Request cancellation. Entries already extracted are discarded.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the build to finish.
    pub async fn wait(self) -> Result<Arc<MetadataIndex>> {
        self.task
            .await
            .map_err(|e| CorpusError::Other(format!("Index build task failed: {}", e)))?
    }
}
