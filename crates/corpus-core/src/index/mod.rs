//! Metadata index: parallel build, snapshot cache and regex search.
//!
//! ```text
//! WorkCatalog ──► IndexBuilder ──► MetadataIndex ──► SearchEngine
//!                     │                  ▲
//!                     └── IndexCache ────┘
//! ```

mod builder;
mod cache;
mod metadata_index;
mod query;

pub use builder::IndexBuilder;
pub use cache::{fingerprint, IndexCache};
pub use metadata_index::{MetadataIndex, SkippedEntry};
pub use query::{compile_query, SearchEngine, SearchMatch, SearchResult};
