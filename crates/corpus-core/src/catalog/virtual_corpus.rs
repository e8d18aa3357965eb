//! Remotely hosted works that appear in the catalog alongside local files.
//!
//! A virtual work's composer cannot be read before it is fetched, so it is
//! registered here and merged into the extracted metadata at index time.

use crate::catalog::entry::{WorkEntry, WorkLocation};
use crate::error::{CorpusError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// A work hosted at a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualWork {
    /// Composer-qualified path the work is addressed by, e.g. `coltrane/giantSteps`.
    pub corpus_path: String,
    pub url: Url,
    pub composer: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Sub-item number when the URL names one tune in a collection file.
    #[serde(default)]
    pub number: Option<String>,
    /// Notation format when the URL path does not end in a usable suffix.
    #[serde(default)]
    pub format: Option<String>,
}

impl VirtualWork {
    pub fn new(corpus_path: impl Into<String>, url: &str, composer: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| CorpusError::Config {
            message: format!("Invalid virtual work URL {}: {}", url, e),
        })?;
        Ok(Self {
            corpus_path: corpus_path.into(),
            url,
            composer: composer.into(),
            title: None,
            number: None,
            format: None,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Lowercase notation extension, from `format` or the URL path suffix.
    pub fn extension(&self) -> String {
        if let Some(format) = &self.format {
            return format.trim_start_matches('.').to_lowercase();
        }
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    fn to_entry(&self) -> WorkEntry {
        let collection = self
            .corpus_path
            .split('/')
            .next()
            .unwrap_or(&self.corpus_path)
            .to_string();

        WorkEntry {
            collection,
            source_path: self.url.to_string(),
            corpus_path: self.corpus_path.clone(),
            work: self.corpus_path.clone(),
            movement: None,
            extension: self.extension(),
            location: WorkLocation::Remote(self.url.clone()),
            number: self.number.clone(),
        }
    }
}

/// Registry of virtual works, in registration order.
#[derive(Debug, Clone, Default)]
pub struct VirtualCorpus {
    works: Vec<VirtualWork>,
}

impl VirtualCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in remote works.
    pub fn with_defaults() -> Self {
        let mut corpus = Self::new();
        for work in builtin_works() {
            corpus.register(work);
        }
        corpus
    }

    /// Register a work. A work with the same URL and number replaces the earlier one.
    pub fn register(&mut self, work: VirtualWork) {
        if let Some(existing) = self
            .works
            .iter_mut()
            .find(|w| w.url == work.url && w.number == work.number)
        {
            *existing = work;
        } else {
            self.works.push(work);
        }
    }

    pub fn works(&self) -> &[VirtualWork] {
        &self.works
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }

    /// Registered metadata for a catalog entry that came from this registry.
    pub fn lookup(&self, entry: &WorkEntry) -> Option<&VirtualWork> {
        self.works
            .iter()
            .find(|w| w.url.as_str() == entry.source_path && w.number == entry.number)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = WorkEntry> + '_ {
        self.works.iter().map(VirtualWork::to_entry)
    }
}

fn builtin_works() -> Vec<VirtualWork> {
    let defs = [
        (
            "coltrane/giantSteps",
            "http://static.wikifonia.org/1164/musicxml.mxl",
            "John Coltrane",
            "Giant Steps",
            None,
        ),
        (
            "bach/bwv773",
            "http://kern.ccarh.org/cgi-bin/ksdata?l=cc/bach/invention&file=inven02.krn&f=xml",
            "J.S. Bach",
            "Invention No. 2 in C minor",
            Some("xml"),
        ),
    ];

    defs.into_iter()
        .filter_map(|(path, url, composer, title, format)| {
            let work = VirtualWork::new(path, url, composer).ok()?.with_title(title);
            Some(match format {
                Some(format) => work.with_format(format),
                None => work,
            })
        })
        .collect()
}
