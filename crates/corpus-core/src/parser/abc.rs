//! ABC notation headers.
//!
//! A file holds one or more tunes, each opened by `X:` and closed by a blank
//! line. Fields read per tune: `T:` title, `C:` composer, `O:` origin (the
//! locale), `M:` meter and `K:` key. `C:` and `O:` lines in the file header
//! apply to every tune that does not set its own.

use crate::error::{CorpusError, Result};
use crate::metadata::{KeySignature, TimeSignature};
use crate::parser::{ParsedScore, ScoreItem, ScoreParser, ScoreSource};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static FIELD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]):\s*(.*)$").unwrap());

static INLINE_METER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[M:\s*([^\]]*)\]").unwrap());

/// Header-only ABC reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbcParser;

impl ScoreParser for AbcParser {
    fn extensions(&self) -> &[&'static str] {
        &["abc"]
    }

    fn parse(&self, source: &ScoreSource) -> Result<ParsedScore> {
        let text = source.text();
        let mut reader = TuneReader::default();
        for line in text.lines() {
            reader.feed(line);
        }

        let items = reader.finish();
        if items.is_empty() {
            return Err(CorpusError::parse(&source.source_path, "no ABC tunes found"));
        }

        debug!("{}: {} ABC tunes", source.source_path, items.len());
        Ok(ParsedScore { items })
    }
}

#[derive(Debug)]
struct Tune {
    item: ScoreItem,
    in_body: bool,
}

impl Tune {
    fn new(number: Option<String>) -> Self {
        Self {
            item: ScoreItem::numbered(number),
            in_body: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.item.titles.is_empty()
            && self.item.key_signature.is_none()
            && self.item.time_signatures.is_empty()
    }

    fn header_field(&mut self, tag: char, value: &str) {
        match tag {
            'T' => self.item.titles.push(value.to_string()),
            'C' => self.item.composers.push(value.to_string()),
            'O' => self.item.locales.push(value.to_string()),
            'M' => self.meter(value),
            'K' => {
                self.item.key_signature = KeySignature::from_abc(value);
                self.in_body = true;
            }
            _ => {}
        }
    }

    fn body_line(&mut self, line: &str) {
        if let Some(caps) = FIELD_LINE.captures(line) {
            if &caps[1] == "M" {
                self.meter(&caps[2]);
            }
            return;
        }
        let meters: Vec<String> = INLINE_METER
            .captures_iter(line)
            .map(|caps| caps[1].to_string())
            .collect();
        for meter in meters {
            self.meter(&meter);
        }
    }

    fn meter(&mut self, value: &str) {
        if let Some(ts) = TimeSignature::parse(value) {
            self.item.add_time_signature(ts);
        }
    }
}

#[derive(Debug, Default)]
struct TuneReader {
    /// Fields seen before the first `X:`.
    preamble: Option<Tune>,
    current: Option<Tune>,
    done: Vec<ScoreItem>,
    saw_reference: bool,
}

impl TuneReader {
    fn feed(&mut self, raw: &str) {
        if raw.trim().is_empty() {
            self.close_tune();
            return;
        }

        let line = strip_comment(raw).trim_end();
        if line.is_empty() {
            return;
        }

        let field = FIELD_LINE
            .captures(line)
            .map(|caps| (caps[1].chars().next().unwrap_or(' '), caps[2].trim().to_string()));

        if let Some(('X', number)) = &field {
            self.close_tune();
            self.saw_reference = true;
            let number = (!number.is_empty()).then(|| number.clone());
            self.current = Some(Tune::new(number));
            return;
        }

        let tune = match (&mut self.current, self.saw_reference) {
            (Some(tune), _) => tune,
            // text between tunes
            (None, true) => return,
            (None, false) => self.preamble.get_or_insert_with(|| Tune::new(None)),
        };

        match field {
            Some((tag, value)) if !tune.in_body => tune.header_field(tag, &value),
            _ if tune.in_body => tune.body_line(line),
            _ => {}
        }
    }

    fn close_tune(&mut self) {
        if let Some(tune) = self.current.take() {
            self.done.push(tune.item);
        }
    }

    fn finish(mut self) -> Vec<ScoreItem> {
        self.close_tune();

        let preamble = self.preamble.take();
        if !self.saw_reference {
            // A file without `X:` is a single untitled-reference tune.
            return preamble
                .filter(|tune| !tune.is_empty())
                .map(|tune| vec![tune.item])
                .unwrap_or_default();
        }

        let (composers, locales) = preamble
            .map(|tune| (tune.item.composers, tune.item.locales))
            .unwrap_or_default();

        let single = self.done.len() == 1;
        self.done
            .into_iter()
            .map(|mut item| {
                if item.composers.is_empty() {
                    item.composers = composers.clone();
                }
                if item.locales.is_empty() {
                    item.locales = locales.clone();
                }
                if single {
                    item.number = None;
                }
                item
            })
            .collect()
    }
}

fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'%' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<ScoreItem> {
        let source = ScoreSource::new("essenFolksong/test.abc", "abc", text.as_bytes().to_vec());
        AbcParser.parse(&source).unwrap().items
    }

    #[test]
    fn test_multi_tune_file() {
        let items = parse(
            "%abc-2.1\n\
             \n\
             X:269\n\
             T:Tiao xi\n\
             O:Asia, China, Han, Taiwan\n\
             M:2/4\n\
             L:1/8\n\
             K:G\n\
             GA Bd|e2 d2|]\n\
             \n\
             X:270\n\
             T:Mo li hua\n\
             O:Asia, China, Han, Sichuan\n\
             M:3/8\n\
             K:Am\n\
             abc|[M:2/4] d2 e2|\n\
             M:3/8\n\
             cde|]\n",
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].number.as_deref(), Some("269"));
        assert_eq!(items[0].titles, ["Tiao xi"]);
        assert_eq!(items[0].locales, ["Asia, China, Han, Taiwan"]);
        assert_eq!(
            items[0].key_signature.unwrap().to_string(),
            "1 sharp, mode major"
        );

        let meters: Vec<String> = items[1].time_signatures.iter().map(|t| t.to_string()).collect();
        assert_eq!(meters, ["3/8", "2/4"]);
    }

    #[test]
    fn test_file_header_composer_applies_to_tunes() {
        let items = parse(
            "C:Trad.\n\
             O:Europe, Germany\n\
             \n\
             X:1\n\
             T:First\n\
             K:D\n\
             d2|]\n\
             \n\
             X:2\n\
             T:Second\n\
             C:Anon\n\
             K:D\n\
             d2|]\n",
        );

        assert_eq!(items[0].composers, ["Trad."]);
        assert_eq!(items[1].composers, ["Anon"]);
        assert_eq!(items[1].locales, ["Europe, Germany"]);
    }

    #[test]
    fn test_single_tune_has_no_number() {
        let items = parse("X:1\nT:Altdeutsch\nM:C|\nK:F\nFGA|]\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].number, None);
        assert_eq!(items[0].time_signatures[0].to_string(), "2/2");
    }

    #[test]
    fn test_file_without_reference_numbers() {
        let items = parse("T:Fortuna d'un gran tempo\nC:Josquin des Prez\nM:C\nK:G dor\nG4|]\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].composers, ["Josquin des Prez"]);
        assert_eq!(
            items[0].key_signature.unwrap().to_string(),
            "1 flat, mode dorian"
        );
    }

    #[test]
    fn test_comments_are_ignored() {
        let items = parse("X:5\nT:Tune % with note\n%M:9/8\nM:6/8\nK:C\nC|]\n");
        assert_eq!(items[0].titles, ["Tune"]);
        assert_eq!(items[0].time_signatures.len(), 1);
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        let source = ScoreSource::new("empty.abc", "abc", b"% nothing here\n".to_vec());
        assert!(matches!(
            AbcParser.parse(&source),
            Err(CorpusError::Parse { .. })
        ));
    }
}
