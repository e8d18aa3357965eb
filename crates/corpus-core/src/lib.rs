//! Corpus Core - work resolution and metadata search over a music corpus.
//!
//! A corpus is a set of collections (one directory per composer or archive)
//! holding notation files, plus virtual works hosted remotely. This crate
//! resolves human-friendly identifiers to file locations and builds a
//! searchable metadata index (composer, locale, time signature, key
//! signature, title) over every work.
//!
//! # Example
//!
//! ```rust,ignore
//! use corpus_core::{Corpus, Field};
//!
//! #[tokio::main]
//! async fn main() -> corpus_core::Result<()> {
//!     let corpus = Corpus::new("/path/to/corpus").await?;
//!
//!     // Resolve a work
//!     let path = corpus.get_work("bach/bwv846", None, &[])?;
//!     println!("{}", path);
//!
//!     // Regex search over extracted metadata
//!     let result = corpus.search("Sichuan|Taiwan", Some(Field::Locale)).await?;
//!     println!("{} tunes", result.total_count);
//!
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod metadata;
pub mod network;
pub mod parser;
pub mod resolver;

mod api;

// Re-export commonly used types
pub use api::{BuildStatus, CorpusBuilder, RebuildHandle};
pub use cancel::{CancellationToken, CancelledError};
pub use catalog::{Collection, MovementNumber, VirtualWork, WorkEntry, WorkLocation};
pub use error::{CorpusError, Result};
pub use index::{MetadataIndex, SearchMatch, SearchResult, SkippedEntry};
pub use metadata::{Field, KeySignature, MetadataBundle, Mode, TimeSignature};
pub use network::{Fetcher, HttpFetcher};
pub use parser::{ParsedScore, ParserRegistry, ScoreItem, ScoreParser, ScoreSource};
pub use resolver::MovementSelector;

use std::path::PathBuf;
use std::sync::Arc;

use api::CorpusState;

/// Main entry point: a scanned catalog plus its lazily built metadata index.
///
/// Cloning is cheap and clones share the index, so a `Corpus` can be handed to
/// as many readers as needed.
#[derive(Clone)]
pub struct Corpus {
    state: Arc<CorpusState>,
}

impl Corpus {
    /// Create a builder for Corpus.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let corpus = Corpus::builder("./corpus")
    ///     .workers(4)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(corpus_root: impl Into<PathBuf>) -> CorpusBuilder {
        CorpusBuilder::new(corpus_root)
    }

    /// Scan a corpus root with the default collections, virtual works and parsers.
    pub async fn new(corpus_root: impl Into<PathBuf>) -> Result<Self> {
        CorpusBuilder::new(corpus_root).build().await
    }
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("corpus_root", &self.state.catalog.corpus_root())
            .field("entries", &self.state.catalog.len())
            .field("parsers", &self.state.parsers)
            .finish()
    }
}
