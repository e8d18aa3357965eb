//! Metadata records, canonical signature forms and JSON persistence.

pub mod atomic;
mod bundle;
mod signature;

pub use atomic::{read_json, write_json_atomic};
pub use bundle::{compare_numbers, Field, MetadataBundle};
pub use signature::{KeySignature, Mode, TimeSignature};
