//! MusicXML headers, plain (`.xml`, `.musicxml`) or compressed (`.mxl`).
//!
//! Only a handful of elements are read: `<work-title>`, `<movement-title>`,
//! `<creator type="composer">`, every `<time>` and the first `<key>`. A score
//! is always a single item.

use crate::error::{CorpusError, Result};
use crate::metadata::{KeySignature, TimeSignature};
use crate::parser::{unescape_xml, ParsedScore, ScoreItem, ScoreParser, ScoreSource};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;
use tracing::debug;

static WORK_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<work-title>(.*?)</work-title>").unwrap());

static MOVEMENT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<movement-title>(.*?)</movement-title>").unwrap());

static COMPOSER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<creator[^>]*\btype\s*=\s*["']composer["'][^>]*>(.*?)</creator>"#).unwrap()
});

/// Body of a `<key>` element (not `<key-step>` and friends).
static KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<key(?:\s[^>]*)?>(.*?)</key>").unwrap());

/// Traditional key content: optional `<cancel>`, then `<fifths>` and an optional `<mode>`.
static TRADITIONAL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:<cancel\b[^>]*>[^<]*</cancel>\s*)?<fifths>\s*(-?\d+)\s*</fifths>(?:\s*<mode>\s*(\w+)\s*</mode>)?",
    )
    .unwrap()
});

static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<time\b[^>]*>\s*<beats>\s*([\d+]+)\s*</beats>\s*<beat-type>\s*(\d+)\s*</beat-type>")
        .unwrap()
});

static ROOTFILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<rootfile[^>]*\bfull-path\s*=\s*"([^"]+)""#).unwrap());

/// Regex-based MusicXML header reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicXmlParser;

impl ScoreParser for MusicXmlParser {
    fn extensions(&self) -> &[&'static str] {
        &["xml", "musicxml", "mxl"]
    }

    fn parse(&self, source: &ScoreSource) -> Result<ParsedScore> {
        let xml = if source.extension == "mxl" {
            read_compressed(source)?
        } else {
            source.text()
        };

        if !xml.contains("<score-partwise") && !xml.contains("<score-timewise") {
            return Err(CorpusError::parse(
                &source.source_path,
                "not a MusicXML score document",
            ));
        }

        let mut item = ScoreItem::default();

        let title = WORK_TITLE
            .captures(&xml)
            .or_else(|| MOVEMENT_TITLE.captures(&xml))
            .map(|caps| unescape_xml(caps[1].trim()));
        item.titles.extend(title);

        item.composers = COMPOSER
            .captures_iter(&xml)
            .map(|caps| unescape_xml(caps[1].trim()))
            .filter(|name| !name.is_empty())
            .collect();

        // only the first key counts, and a non-traditional one gives none
        item.key_signature = KEY
            .captures(&xml)
            .and_then(|key| {
                let body = key.get(1)?.as_str();
                TRADITIONAL_KEY.captures(body)
            })
            .and_then(|caps| {
                let fifths = caps[1].parse().ok()?;
                Some(KeySignature::from_fifths(fifths, caps.get(2).map(|m| m.as_str())))
            });

        for caps in TIME.captures_iter(&xml) {
            if let Some(ts) = TimeSignature::from_beats(&caps[1], &caps[2]) {
                item.add_time_signature(ts);
            }
        }

        Ok(ParsedScore { items: vec![item] })
    }
}

/// Extract the root score document from an `.mxl` archive.
fn read_compressed(source: &ScoreSource) -> Result<String> {
    let zip_err = |e: zip::result::ZipError| {
        CorpusError::parse(&source.source_path, format!("invalid mxl archive: {}", e))
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(&source.bytes)).map_err(zip_err)?;

    let container = read_entry(&mut archive, "META-INF/container.xml").ok();
    let root = container
        .as_deref()
        .and_then(|xml| ROOTFILE.captures(xml))
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            archive
                .file_names()
                .filter(|name| !name.starts_with("META-INF/"))
                .find(|name| name.ends_with(".xml") || name.ends_with(".musicxml"))
                .map(str::to_string)
        })
        .ok_or_else(|| CorpusError::parse(&source.source_path, "mxl archive has no score"))?;

    debug!("{}: reading {} from archive", source.source_path, root);
    read_entry(&mut archive, &root).map_err(zip_err)
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&Vec<u8>>>,
    name: &str,
) -> std::result::Result<String, zip::result::ZipError> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
