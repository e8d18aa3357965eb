//! Metadata index and search methods for Corpus.

use std::sync::Arc;
use tracing::info;

use crate::api::state::{BuildStatus, RebuildHandle};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::index::{MetadataIndex, SearchEngine, SearchResult};
use crate::metadata::Field;
use crate::Corpus;

impl Corpus {
    /// Search the metadata index, building it on first use.
    ///
    /// `query` is always a regular expression matched anywhere in a value:
    /// `"Taiwan"` matches `"Asia, China, Han, Taiwan"` and `"Sichuan|Taiwan"`
    /// matches either. With `field` unset, title and composer are searched
    /// and each bundle is reported at most once.
    pub async fn search(&self, query: &str, field: Option<Field>) -> Result<SearchResult> {
        let index = self.index().await?;
        SearchEngine::new(&index).search(query, field)
    }

    /// Like [`Corpus::search`] with the field given by name (`"locale"`,
    /// `"timeSignature"`, ...). Unknown names fail with `UnknownField`.
    pub async fn search_field(&self, query: &str, field: &str) -> Result<SearchResult> {
        let field: Field = field.parse()?;
        self.search(query, Some(field)).await
    }

    /// The metadata index, built or loaded from cache on first call.
    pub async fn index(&self) -> Result<Arc<MetadataIndex>> {
        self.state.ensure_index().await
    }

    /// The index if one has been built, without triggering a build.
    pub async fn current_index(&self) -> Option<Arc<MetadataIndex>> {
        self.state.index.read().await.clone()
    }

    /// Rebuild the index from the sources, bypassing the cache, and swap it in
    /// once complete.
    pub async fn rebuild_index(&self) -> Result<Arc<MetadataIndex>> {
        self.state.rebuild(&CancellationToken::new()).await
    }

    /// Rebuild with a caller-owned cancellation token.
    pub async fn rebuild_index_with_token(
        &self,
        token: &CancellationToken,
    ) -> Result<Arc<MetadataIndex>> {
        self.state.rebuild(token).await
    }

    /// Start a rebuild on the tokio runtime. Queries keep using the previous
    /// index until the new one is complete.
    pub fn spawn_rebuild(&self) -> RebuildHandle {
        let token = CancellationToken::new();
        let state = Arc::clone(&self.state);
        let task_token = token.clone();

        info!("Starting background index rebuild");
        let task = tokio::spawn(async move { state.rebuild(&task_token).await });
        RebuildHandle::new(token, task)
    }

    /// Status of the most recent build.
    pub async fn build_status(&self) -> BuildStatus {
        self.state.status.read().await.clone()
    }

    /// Delete the on-disk index snapshot, if caching is enabled.
    pub fn clear_index_cache(&self) -> Result<()> {
        match &self.state.cache {
            Some(cache) => cache.clear(),
            None => Ok(()),
        }
    }
}
