//! Work entries: one concrete retrievable file or URL per entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Movement number inferred from a movement file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementNumber {
    /// `movement3`, `3` or `03`.
    Single(u32),
    /// Hyphenated part/sub numbering such as `movement1-01`.
    ///
    /// `label` keeps the digits as written so `"1-01"` can be matched exactly.
    Composite { part: u32, sub: u32, label: String },
}

impl MovementNumber {
    /// Parse a movement label (`"3"`, `"03"`, `"1-01"`).
    pub fn parse(label: &str) -> Option<Self> {
        match label.split_once('-') {
            None => label.parse().ok().map(MovementNumber::Single),
            Some((part, sub)) => {
                let part = part.parse().ok()?;
                let sub = sub.parse().ok()?;
                Some(MovementNumber::Composite {
                    part,
                    sub,
                    label: label.to_string(),
                })
            }
        }
    }

    /// Leading numeric component: the movement itself, or the part of a composite.
    pub fn primary(&self) -> u32 {
        match self {
            MovementNumber::Single(n) => *n,
            MovementNumber::Composite { part, .. } => *part,
        }
    }
}

impl fmt::Display for MovementNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementNumber::Single(n) => write!(f, "{}", n),
            MovementNumber::Composite { label, .. } => f.write_str(label),
        }
    }
}

/// Where a work entry lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum WorkLocation {
    Local(PathBuf),
    Remote(Url),
}

impl WorkLocation {
    pub fn is_remote(&self) -> bool {
        matches!(self, WorkLocation::Remote(_))
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            WorkLocation::Local(path) => Some(path),
            WorkLocation::Remote(_) => None,
        }
    }

    /// Location rendered with `/` separators on every platform.
    pub fn to_slash_string(&self) -> String {
        match self {
            WorkLocation::Local(path) => path.to_string_lossy().replace('\\', "/"),
            WorkLocation::Remote(url) => url.to_string(),
        }
    }

    /// Whether the location ends with `suffix`, ignoring separator style.
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.to_slash_string().ends_with(&suffix.replace('\\', "/"))
    }
}

impl fmt::Display for WorkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkLocation::Local(path) => write!(f, "{}", path.display()),
            WorkLocation::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// One concrete retrievable unit of a work.
///
/// Within a collection, `(source_path, movement)` pairs are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry {
    /// Owning collection (first segment of `corpus_path`).
    pub collection: String,
    /// Relative path with `/` separators for local files, the URL for virtual ones.
    pub source_path: String,
    /// Composer-qualified path without extension, e.g. `bach/bwv846/movement1`.
    pub corpus_path: String,
    /// Logical work this entry belongs to, e.g. `bach/bwv846`.
    pub work: String,
    pub movement: Option<MovementNumber>,
    /// Lowercase file suffix without the dot.
    pub extension: String,
    pub location: WorkLocation,
    /// Sub-item number for virtual works that point into a collection file.
    pub number: Option<String>,
}

impl WorkEntry {
    pub fn is_virtual(&self) -> bool {
        self.location.is_remote()
    }

    /// Keys an identifier may name this entry by, most specific first.
    pub(crate) fn identifier_keys(&self) -> [&str; 3] {
        [
            self.source_path.as_str(),
            self.corpus_path.as_str(),
            self.work.as_str(),
        ]
    }
}
