//! Path resolution methods for Corpus.

use std::path::Path;

use crate::catalog::{Collection, VirtualWork, WorkCatalog, WorkEntry, WorkLocation};
use crate::error::Result;
use crate::resolver::{MovementSelector, PathResolver};
use crate::Corpus;

impl Corpus {
    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.state.catalog)
    }

    /// Resolve an identifier to one location: the first match in catalog order.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Relative path, `composer/work`, or a bare stem like `altdeu10`
    /// * `movement` - Optional movement selector
    /// * `extensions` - Accepted extensions, with or without the dot; empty accepts all
    ///
    /// Returns [`crate::CorpusError::NotFound`] when nothing matches.
    pub fn get_work(
        &self,
        identifier: &str,
        movement: Option<MovementSelector>,
        extensions: &[&str],
    ) -> Result<WorkLocation> {
        self.resolver()
            .get_work(identifier, movement.as_ref(), extensions)
    }

    /// Every location the identifier resolves to, in catalog order. Never errors.
    pub fn get_work_list(
        &self,
        identifier: &str,
        movement: Option<MovementSelector>,
        extensions: &[&str],
    ) -> Vec<WorkLocation> {
        self.resolver()
            .get_work_list(identifier, movement.as_ref(), extensions)
    }

    /// All local and virtual locations under `<composer>/`.
    pub fn get_composer(&self, composer: &str, extensions: &[&str]) -> Vec<WorkLocation> {
        self.resolver().get_composer(composer, extensions)
    }

    /// Every local file with one of the given extensions.
    pub fn get_paths(&self, extensions: &[&str]) -> Vec<WorkLocation> {
        self.resolver().get_paths(extensions)
    }

    /// Catalog entries the identifier resolves to, with their movement and format detail.
    pub fn get_entries(
        &self,
        identifier: &str,
        movement: Option<MovementSelector>,
        extensions: &[&str],
    ) -> Vec<&WorkEntry> {
        self.resolver()
            .matching_entries(identifier, movement.as_ref(), extensions)
    }

    pub fn corpus_root(&self) -> &Path {
        self.state.catalog.corpus_root()
    }

    pub fn catalog(&self) -> &WorkCatalog {
        &self.state.catalog
    }

    pub fn collections(&self) -> &[Collection] {
        self.state.catalog.collections()
    }

    pub fn virtual_works(&self) -> &[VirtualWork] {
        self.state.virtual_corpus.works()
    }
}
