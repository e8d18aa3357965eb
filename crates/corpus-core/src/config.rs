//! Centralized configuration for the corpus library.
//!
//! Constant groups for scanning, index building and network access. Runtime
//! choices (corpus root, collections, cache location) go through
//! [`crate::CorpusBuilder`].

use std::time::Duration;

/// Corpus-level configuration.
pub struct CorpusConfig;

impl CorpusConfig {
    pub const APP_NAME: &'static str = "corpus";

    /// Notation file extensions picked up by the storage scan (without the dot).
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &[
        "abc", "capx", "mid", "midi", "xml", "mxl", "mx", "musicxml", "md", "musedata", "zip",
        "krn", "rntxt", "rntext", "romantext", "rtxt", "nwctxt", "nwc",
    ];

    /// Stem prefix used by movement files inside a work directory.
    pub const MOVEMENT_PREFIX: &'static str = "movement";
}

/// Index build and cache configuration.
pub struct IndexConfig;

impl IndexConfig {
    /// Fallback worker count when the platform cannot report parallelism.
    pub const FALLBACK_WORKERS: usize = 4;
    pub const CACHE_DIR_NAME: &'static str = "corpus";
    pub const CACHE_FILENAME: &'static str = "metadata-index.json";
    /// Bumped whenever bundle extraction changes shape or canonical forms.
    pub const CACHE_FORMAT_VERSION: u32 = 1;

    /// Default number of concurrent parse workers.
    pub fn default_workers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(Self::FALLBACK_WORKERS)
    }
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &'static str = concat!("corpus-core/", env!("CARGO_PKG_VERSION"));
    /// Attempts per remote fetch, including the first.
    pub const MAX_FETCH_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);
}
