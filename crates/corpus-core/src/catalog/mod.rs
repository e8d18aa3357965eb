//! Work catalog: collections, scanned local files and virtual works.
//!
//! ```text
//! WorkCatalog
//!     │
//!     ├── Collection      - name, storage root, catalogue aliases
//!     ├── StorageSource   - filesystem walk by extension
//!     └── VirtualCorpus   - remote works with registered composers
//! ```

mod collection;
mod entry;
mod scanner;
mod virtual_corpus;
mod work_catalog;

pub use collection::{default_collections, Collection};
pub use entry::{MovementNumber, WorkEntry, WorkLocation};
pub use scanner::{movement_from_stem, FileStamp, FileSystemStorage, StorageSource};
pub use virtual_corpus::{VirtualCorpus, VirtualWork};
pub use work_catalog::WorkCatalog;
