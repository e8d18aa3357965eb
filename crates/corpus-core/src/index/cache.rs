//! Persisted index snapshots.
//!
//! A snapshot is keyed by a BLAKE3 fingerprint of everything the build reads:
//! local entry paths with their size and mtime, registered virtual works,
//! parser extensions and the cache format version. Any difference, or a
//! snapshot that fails to load, means a full rebuild.

use crate::catalog::{StorageSource, VirtualCorpus, WorkCatalog};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::metadata_index::{MetadataIndex, SkippedEntry};
use crate::metadata::{read_json, write_json_atomic, MetadataBundle};
use crate::parser::ParserRegistry;
use blake3::Hasher as Blake3Hasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexSnapshot {
    version: u32,
    fingerprint: String,
    created_at: DateTime<Utc>,
    bundles: Vec<MetadataBundle>,
    skipped: Vec<SkippedEntry>,
}

/// Compute the fingerprint of the inputs an index build would read.
pub fn fingerprint(
    catalog: &WorkCatalog,
    virtual_corpus: &VirtualCorpus,
    parsers: &ParserRegistry,
    storage: &dyn StorageSource,
) -> String {
    let mut hasher = Blake3Hasher::new();
    let mut field = |bytes: &[u8]| {
        hasher.update(bytes);
        hasher.update(b"\0");
    };

    field(&IndexConfig::CACHE_FORMAT_VERSION.to_le_bytes());

    for ext in parsers.extensions() {
        field(ext.as_bytes());
    }

    for entry in catalog.local_entries() {
        field(entry.source_path.as_bytes());
        match entry.location.as_local().map(|path| storage.stamp(path)) {
            Some(Ok(stamp)) => {
                field(&stamp.size.to_le_bytes());
                field(&stamp.modified_secs.to_le_bytes());
            }
            _ => field(b"missing"),
        }
    }

    for work in virtual_corpus.works() {
        field(work.corpus_path.as_bytes());
        field(work.url.as_str().as_bytes());
        field(work.number.as_deref().unwrap_or("").as_bytes());
        field(work.composer.as_bytes());
        field(work.title.as_deref().unwrap_or("").as_bytes());
        field(work.format.as_deref().unwrap_or("").as_bytes());
    }

    hasher.finalize().to_hex().to_string()
}

/// On-disk index snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    /// Cache file inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(IndexConfig::CACHE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot if it exists and was built from the same inputs.
    pub fn load(&self, fingerprint: &str) -> Option<MetadataIndex> {
        let snapshot: IndexSnapshot = match read_json(&self.path) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("No index cache at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Ignoring unreadable index cache: {}", e);
                return None;
            }
        };

        if snapshot.version != IndexConfig::CACHE_FORMAT_VERSION
            || snapshot.fingerprint != fingerprint
        {
            info!(
                "Index cache is stale (built {}), rebuilding",
                snapshot.created_at.to_rfc3339()
            );
            return None;
        }

        info!(
            "Loaded {} bundles from index cache {}",
            snapshot.bundles.len(),
            self.path.display()
        );
        Some(MetadataIndex::new(snapshot.bundles, snapshot.skipped))
    }

    /// Persist an index under the given fingerprint.
    pub fn store(&self, index: &MetadataIndex, fingerprint: &str) -> Result<()> {
        let snapshot = IndexSnapshot {
            version: IndexConfig::CACHE_FORMAT_VERSION,
            fingerprint: fingerprint.to_string(),
            created_at: Utc::now(),
            bundles: index.bundles().to_vec(),
            skipped: index.skipped().to_vec(),
        };
        write_json_atomic(&self.path, &snapshot)?;
        debug!("Stored index cache at {}", self.path.display());
        Ok(())
    }

    /// Remove the snapshot if present.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::error::CorpusError::io_with_path(e, &self.path)),
        }
    }
}
