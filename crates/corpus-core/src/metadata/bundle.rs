//! Searchable fields and the per-work metadata bundle.

use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A searchable metadata dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Composer,
    Locale,
    TimeSignature,
    KeySignature,
    Title,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Composer,
        Field::Locale,
        Field::TimeSignature,
        Field::KeySignature,
        Field::Title,
    ];

    /// Fields searched when a query names none.
    pub const DEFAULT_TEXT: [Field; 2] = [Field::Title, Field::Composer];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Composer => "composer",
            Field::Locale => "locale",
            Field::TimeSignature => "timeSignature",
            Field::KeySignature => "keySignature",
            Field::Title => "title",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = CorpusError;

    /// Accepts `timeSignature`, `time_signature` and any casing of either.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        Field::ALL
            .into_iter()
            .find(|field| field.as_str().to_lowercase() == folded)
            .ok_or_else(|| CorpusError::UnknownField(s.to_string()))
    }
}

/// Extracted metadata for one work, or one numbered item of a multi-item file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBundle {
    pub source_path: String,
    pub number: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<Field, Vec<String>>,
}

impl MetadataBundle {
    pub fn new(source_path: impl Into<String>, number: Option<String>) -> Self {
        Self {
            source_path: source_path.into(),
            number,
            fields: BTreeMap::new(),
        }
    }

    /// Add a value to a field. Blank and repeated values are dropped.
    pub fn push_value(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let values = self.fields.entry(field).or_default();
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    /// Values stored for a field; empty when the field was not extracted.
    pub fn values(&self, field: Field) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: Field) -> Option<&str> {
        self.values(field).first().map(String::as_str)
    }

    pub fn has(&self, field: Field) -> bool {
        !self.values(field).is_empty()
    }

    /// Order by source path, then item number.
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        self.source_path
            .cmp(&other.source_path)
            .then_with(|| compare_numbers(self.number.as_deref(), other.number.as_deref()))
    }
}

/// Compare item numbers: absent first, numerically when both are all digits.
pub fn compare_numbers(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) if is_digits(a) && is_digits(b) => {
            let (x, y) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
            x.len()
                .cmp(&y.len())
                .then_with(|| x.cmp(y))
                .then_with(|| a.cmp(b))
        }
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// Non-empty and ASCII digits only (no sign).
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!("timeSignature".parse::<Field>().unwrap(), Field::TimeSignature);
        assert_eq!("key_signature".parse::<Field>().unwrap(), Field::KeySignature);
        assert_eq!("LOCALE".parse::<Field>().unwrap(), Field::Locale);
        assert!(matches!(
            "tempo".parse::<Field>(),
            Err(CorpusError::UnknownField(name)) if name == "tempo"
        ));
        assert_eq!(Field::KeySignature.to_string(), "keySignature");
    }

    #[test]
    fn test_push_value_dedupes() {
        let mut bundle = MetadataBundle::new("essenFolksong/han1.abc", Some("269".into()));
        bundle.push_value(Field::TimeSignature, "2/4");
        bundle.push_value(Field::TimeSignature, "3/4");
        bundle.push_value(Field::TimeSignature, "2/4");
        bundle.push_value(Field::Title, "   ");

        assert_eq!(bundle.values(Field::TimeSignature), ["2/4", "3/4"]);
        assert!(!bundle.has(Field::Title));
        assert_eq!(bundle.first(Field::Composer), None);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(compare_numbers(Some("9"), Some("10")), Ordering::Less);
        assert_eq!(compare_numbers(None, Some("1")), Ordering::Less);
        assert_eq!(compare_numbers(Some("1a"), Some("1b")), Ordering::Less);
        assert_eq!(compare_numbers(Some("007"), Some("10")), Ordering::Less);
        assert_eq!(
            compare_numbers(Some("99999999999999999999"), Some("100000000000000000000")),
            Ordering::Less
        );
        // a sign makes it a label, compared as a string
        assert_eq!(compare_numbers(Some("+5"), Some("10")), Ordering::Less);
        assert_eq!(compare_numbers(Some("+50"), Some("+6")), Ordering::Less);

        let a = MetadataBundle::new("essenFolksong/han1.abc", Some("530".into()));
        let b = MetadataBundle::new("essenFolksong/han2.abc", Some("204".into()));
        assert_eq!(a.cmp_position(&b), Ordering::Less);
    }

    #[test]
    fn test_bundle_json_uses_field_names() {
        let mut bundle = MetadataBundle::new("bach/bwv846/movement1.mxl", None);
        bundle.push_value(Field::KeySignature, "no sharps or flats, mode major");

        let json = serde_json::to_string(&bundle).unwrap();
        assert!(json.contains("\"keySignature\""));
        assert!(json.contains("\"sourcePath\""));

        let back: MetadataBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }
}
