//! Known collections and their storage roots.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A named collection of works, usually one composer or one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    /// Storage root override. Defaults to `<corpus root>/<name>`.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Catalogue prefixes that identify this collection, e.g. `bwv` for Bach.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Directory holding this collection's local files.
    pub fn storage_root(&self, corpus_root: &Path) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| corpus_root.join(&self.name))
    }

    /// Whether a bare identifier carries one of this collection's catalogue prefixes.
    ///
    /// The prefix must be followed by a digit: `bwv846` matches `bwv`, `bwvx` does not.
    pub fn claims_identifier(&self, identifier: &str) -> bool {
        self.aliases.iter().any(|alias| {
            identifier
                .strip_prefix(alias.as_str())
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        })
    }
}

/// Collections registered by default, in catalog order.
pub fn default_collections() -> Vec<Collection> {
    let plain = [
        "airdsAirs",
        "beethoven",
        "ciconia",
        "corelli",
        "cpebach",
        "demos",
        "essenFolksong",
        "haydn",
        "josquin",
        "leadSheet",
        "luca",
        "miscFolk",
        "monteverdi",
        "oneills1850",
        "palestrina",
        "ryansMammoth",
        "schoenberg",
        "schumann",
        "schumann_clara",
        "theoryExercises",
        "trecento",
        "verdi",
        "weber",
    ];

    let mut collections = vec![
        Collection::new("bach").with_alias("bwv"),
        Collection::new("handel").with_alias("hwv"),
        Collection::new("mozart").with_alias("k"),
    ];
    collections.extend(plain.into_iter().map(Collection::new));
    collections
}
