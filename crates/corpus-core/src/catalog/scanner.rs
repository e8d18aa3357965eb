//! Storage access and the filesystem scan that turns files into work entries.
//!
//! Layout conventions:
//! - `<collection>/<work>.<ext>` is a single-file work with no movement.
//! - `<collection>/<work>/<movement>.<ext>` is one movement of `<work>`; the
//!   movement number comes from the file stem (`movement3`, `03`, `movement1-01`).

use crate::catalog::entry::{MovementNumber, WorkEntry, WorkLocation};
use crate::config::CorpusConfig;
use crate::error::{CorpusError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Movement file stems: optional `movement` prefix, then `N` or `N-M`.
static MOVEMENT_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:{})?(\d+(?:-\d+)?)$",
        CorpusConfig::MOVEMENT_PREFIX
    ))
    .unwrap()
});

/// Size and modification time of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub size: u64,
    pub modified_secs: i64,
}

/// Storage collaborator: enumerates files and supplies their bytes.
pub trait StorageSource: Send + Sync {
    /// Paths relative to `root` whose extension is in `extensions`, in a stable order.
    ///
    /// A missing root yields an empty list.
    fn list_files(&self, root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>>;

    /// Raw bytes of a stored file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Size and modification time, used for cache invalidation.
    fn stamp(&self, path: &Path) -> Result<FileStamp>;
}

/// Local filesystem storage backed by `walkdir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemStorage;

impl StorageSource for FileSystemStorage {
    fn list_files(&self, root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            debug!("Collection root {} does not exist, skipping", root.display());
            return Ok(Vec::new());
        }

        let files = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable path under {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|ext| {
                        let ext = ext.to_string_lossy().to_lowercase();
                        extensions.contains(&ext.as_str())
                    })
                    .unwrap_or(false)
            })
            .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();

        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| CorpusError::io_with_path(e, path))
    }

    fn stamp(&self, path: &Path) -> Result<FileStamp> {
        let metadata = std::fs::metadata(path).map_err(|e| CorpusError::io_with_path(e, path))?;
        let modified_secs = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(FileStamp {
            size: metadata.len(),
            modified_secs,
        })
    }
}

/// Movement number encoded in a file stem, if any.
pub fn movement_from_stem(stem: &str) -> Option<MovementNumber> {
    MOVEMENT_STEM
        .captures(stem)
        .and_then(|caps| caps.get(1))
        .and_then(|m| MovementNumber::parse(m.as_str()))
}

/// Build the work entry for a file found under a collection root.
///
/// `relative` is relative to the collection root, `location` is the full path.
pub(crate) fn describe_local_file(
    collection: &str,
    relative: &Path,
    location: PathBuf,
) -> Option<WorkEntry> {
    let raw_extension = relative.extension()?.to_string_lossy().to_string();
    let stem = relative.file_stem()?.to_string_lossy().to_string();

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let relative_slash = segments.join("/");

    let source_path = format!("{}/{}", collection, relative_slash);
    let corpus_path = source_path
        .strip_suffix(&format!(".{}", raw_extension))
        .unwrap_or(&source_path)
        .to_string();

    let (work, movement) = if segments.len() > 1 {
        let parent = segments[..segments.len() - 1].join("/");
        (format!("{}/{}", collection, parent), movement_from_stem(&stem))
    } else {
        (corpus_path.clone(), None)
    };

    Some(WorkEntry {
        collection: collection.to_string(),
        source_path,
        corpus_path,
        work,
        movement,
        extension: raw_extension.to_lowercase(),
        location: WorkLocation::Local(location),
        number: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_movement_from_stem() {
        assert_eq!(movement_from_stem("movement4"), Some(MovementNumber::Single(4)));
        assert_eq!(movement_from_stem("02"), Some(MovementNumber::Single(2)));
        assert_eq!(
            movement_from_stem("movement1-01").map(|m| m.to_string()),
            Some("1-01".to_string())
        );
        assert_eq!(movement_from_stem("opus18no1"), None);
    }

    #[test]
    fn test_describe_single_file_work() {
        let entry = describe_local_file(
            "essenFolksong",
            Path::new("altdeu10.abc"),
            PathBuf::from("/corpus/essenFolksong/altdeu10.abc"),
        )
        .unwrap();

        assert_eq!(entry.source_path, "essenFolksong/altdeu10.abc");
        assert_eq!(entry.corpus_path, "essenFolksong/altdeu10");
        assert_eq!(entry.work, "essenFolksong/altdeu10");
        assert_eq!(entry.extension, "abc");
        assert!(entry.movement.is_none());
        assert!(!entry.is_virtual());
    }

    #[test]
    fn test_describe_movement_file() {
        let entry = describe_local_file(
            "handel",
            Path::new("hwv56/movement1-01.MD"),
            PathBuf::from("/corpus/handel/hwv56/movement1-01.MD"),
        )
        .unwrap();

        assert_eq!(entry.work, "handel/hwv56");
        assert_eq!(entry.corpus_path, "handel/hwv56/movement1-01");
        assert_eq!(entry.extension, "md");
        assert_eq!(entry.movement.unwrap().to_string(), "1-01");
    }

    #[test]
    fn test_list_files_filters_and_orders() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("b_work")).unwrap();
        std::fs::write(root.join("b_work/movement2.mxl"), b"").unwrap();
        std::fs::write(root.join("b_work/movement1.mxl"), b"").unwrap();
        std::fs::write(root.join("a.abc"), b"").unwrap();
        std::fs::write(root.join("notes.txt"), b"").unwrap();

        let files = FileSystemStorage.list_files(root, &["abc", "mxl"]).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.abc"),
                PathBuf::from("b_work/movement1.mxl"),
                PathBuf::from("b_work/movement2.mxl"),
            ]
        );
    }

    #[test]
    fn test_list_files_missing_root_is_empty() {
        let files = FileSystemStorage
            .list_files(Path::new("/nonexistent/corpus/root"), &["abc"])
            .unwrap();
        assert!(files.is_empty());
    }
}
