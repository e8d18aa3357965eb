//! Notation parsing collaborators.
//!
//! Parsers only read header-level metadata (titles, composers, meters and
//! keys); they never interpret the music itself. Each parser declares the
//! extensions it handles and is looked up through a [`ParserRegistry`].

mod abc;
mod musicxml;

pub use abc::AbcParser;
pub use musicxml::MusicXmlParser;

use crate::error::{CorpusError, Result};
use crate::metadata::{KeySignature, TimeSignature};
use crate::resolver::normalize_extension;
use std::collections::HashMap;
use std::sync::Arc;

/// Raw bytes of one catalog entry, as handed to a parser.
#[derive(Debug, Clone)]
pub struct ScoreSource {
    /// Corpus-relative path or URL, used in diagnostics.
    pub source_path: String,
    /// Normalized extension (no dot, lowercase).
    pub extension: String,
    pub bytes: Vec<u8>,
}

impl ScoreSource {
    pub fn new(source_path: impl Into<String>, extension: &str, bytes: Vec<u8>) -> Self {
        Self {
            source_path: source_path.into(),
            extension: normalize_extension(extension),
            bytes,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Header metadata of one piece within a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreItem {
    /// Item number for multi-item sources, `None` for single works.
    pub number: Option<String>,
    pub titles: Vec<String>,
    pub composers: Vec<String>,
    pub locales: Vec<String>,
    /// First key signature of the first part.
    pub key_signature: Option<KeySignature>,
    /// Every distinct meter, in order of appearance.
    pub time_signatures: Vec<TimeSignature>,
}

impl ScoreItem {
    pub fn numbered(number: Option<String>) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub(crate) fn add_time_signature(&mut self, ts: TimeSignature) {
        if !self.time_signatures.contains(&ts) {
            self.time_signatures.push(ts);
        }
    }
}

/// Result of parsing a source: one item, or one per numbered piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScore {
    pub items: Vec<ScoreItem>,
}

/// A notation format reader.
pub trait ScoreParser: Send + Sync {
    /// Extensions this parser handles (lowercase, no dot).
    fn extensions(&self) -> &[&'static str];

    fn parse(&self, source: &ScoreSource) -> Result<ParsedScore>;
}

/// Parsers keyed by file extension.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn ScoreParser>>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in ABC and MusicXML parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AbcParser));
        registry.register(Arc::new(MusicXmlParser));
        registry
    }

    /// Register a parser for every extension it declares, replacing earlier ones.
    pub fn register(&mut self, parser: Arc<dyn ScoreParser>) {
        for ext in parser.extensions() {
            self.parsers.insert(normalize_extension(ext), Arc::clone(&parser));
        }
    }

    pub fn register_for(&mut self, extension: &str, parser: Arc<dyn ScoreParser>) {
        self.parsers.insert(normalize_extension(extension), parser);
    }

    pub fn get(&self, extension: &str) -> Option<Arc<dyn ScoreParser>> {
        self.parsers.get(&normalize_extension(extension)).cloned()
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.parsers.contains_key(&normalize_extension(extension))
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<String> {
        let mut exts: Vec<String> = self.parsers.keys().cloned().collect();
        exts.sort();
        exts
    }

    /// Parse a source with the parser registered for its extension.
    pub fn parse(&self, source: &ScoreSource) -> Result<ParsedScore> {
        let parser = self
            .get(&source.extension)
            .ok_or_else(|| CorpusError::UnsupportedFormat {
                extension: source.extension.clone(),
            })?;
        parser.parse(source)
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

/// Replace the five predefined XML entities.
pub(crate) fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
