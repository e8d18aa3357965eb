//! API implementation submodules.
//!
//! Each submodule contains `impl Corpus` blocks for one family of
//! operations. The struct itself lives in `lib.rs`.

mod builder;
mod search;
mod state;
mod works;

pub use builder::CorpusBuilder;
pub use state::{BuildStatus, RebuildHandle};
pub(crate) use state::CorpusState;
