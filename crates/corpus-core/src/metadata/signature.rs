//! Key and time signatures in their canonical indexed form.
//!
//! Both parsers reduce what they read to these types, so the strings stored in
//! the index are identical whether a work came from ABC or MusicXML.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Modal flavor of a key signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    /// Recognize a mode name or its three-letter abbreviation (`"dor"`, `"min"`, `"m"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if name == "m" {
            return Some(Mode::Minor);
        }
        let prefix = name.get(..3)?;
        match prefix {
            "maj" | "ion" => Some(Mode::Major),
            "min" => Some(Mode::Minor),
            "dor" => Some(Mode::Dorian),
            "phr" => Some(Mode::Phrygian),
            "lyd" => Some(Mode::Lydian),
            "mix" => Some(Mode::Mixolydian),
            "aeo" => Some(Mode::Aeolian),
            "loc" => Some(Mode::Locrian),
            _ => None,
        }
    }

    /// Fifths to add to the tonic's position to get the signature.
    fn fifths_offset(self) -> i32 {
        match self {
            Mode::Lydian => 1,
            Mode::Major => 0,
            Mode::Mixolydian => -1,
            Mode::Dorian => -2,
            Mode::Minor | Mode::Aeolian => -3,
            Mode::Phrygian => -4,
            Mode::Locrian => -5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed count of sharps (positive) or flats (negative), with an optional mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub sharps: i32,
    pub mode: Option<Mode>,
}

impl KeySignature {
    pub fn new(sharps: i32, mode: Option<Mode>) -> Self {
        Self { sharps, mode }
    }

    /// Parse an ABC `K:` value such as `G`, `Bbm`, `D dor`, `F#min clef=bass` or `none`.
    pub fn from_abc(value: &str) -> Option<Self> {
        let value = value.trim();
        match value {
            "" | "none" => return Some(Self::new(0, None)),
            "HP" => return Some(Self::new(0, None)),
            "Hp" => return Some(Self::new(2, Some(Mode::Mixolydian))),
            _ => {}
        }

        let mut chars = value.char_indices();
        let (_, letter) = chars.next()?;
        let mut position = match letter.to_ascii_uppercase() {
            'F' => -1,
            'C' => 0,
            'G' => 1,
            'D' => 2,
            'A' => 3,
            'E' => 4,
            'B' => 5,
            _ => return None,
        };

        let mut rest = &value[letter.len_utf8()..];
        match rest.chars().next() {
            Some('#') => {
                position += 7;
                rest = &rest[1..];
            }
            Some('b') => {
                position -= 7;
                rest = &rest[1..];
            }
            _ => {}
        }

        // Mode is either glued to the tonic (`Am`, `Ddor`) or the next token.
        let token = rest.split_whitespace().next().unwrap_or("");
        let word: String = token.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let mode = if word.is_empty() {
            Mode::Major
        } else {
            Mode::from_name(&word).unwrap_or(Mode::Major)
        };

        Some(Self::new(position + mode.fifths_offset(), Some(mode)))
    }

    /// Build from a MusicXML `<fifths>` count and optional `<mode>` text.
    pub fn from_fifths(fifths: i32, mode: Option<&str>) -> Self {
        Self::new(fifths, mode.and_then(Mode::from_name))
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sharps {
            0 => f.write_str("no sharps or flats")?,
            1 => f.write_str("1 sharp")?,
            -1 => f.write_str("1 flat")?,
            n if n > 0 => write!(f, "{} sharps", n)?,
            n => write!(f, "{} flats", -n)?,
        }
        if let Some(mode) = self.mode {
            write!(f, ", mode {}", mode)?;
        }
        Ok(())
    }
}

/// A meter such as 3/8. Additive numerators are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse `3/8`, `(2+3)/8`, `C` or `C|`. `none` and free meter give `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value {
            "C" => return Some(Self::new(4, 4)),
            "C|" => return Some(Self::new(2, 2)),
            _ => {}
        }

        let (numerator, denominator) = value.split_once('/')?;
        let numerator = numerator
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split('+')
            .map(|part| part.trim().parse::<u32>().ok())
            .sum::<Option<u32>>()?;
        let denominator: u32 = denominator.trim().parse().ok()?;

        if numerator == 0 || denominator == 0 {
            return None;
        }
        Some(Self::new(numerator, denominator))
    }

    /// Build from MusicXML `<beats>` (possibly `2+3`) and `<beat-type>` text.
    pub fn from_beats(beats: &str, beat_type: &str) -> Option<Self> {
        Self::parse(&format!("{}/{}", beats, beat_type))
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
