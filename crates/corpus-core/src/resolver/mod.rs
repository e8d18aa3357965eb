//! Work, composer and extension lookups over the catalog.

mod path_resolver;
mod selector;

pub use path_resolver::PathResolver;
pub use selector::{extension_allowed, normalize_extension, normalize_identifier, MovementSelector};
