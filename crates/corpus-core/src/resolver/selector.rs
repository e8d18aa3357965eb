//! Movement selectors and identifier/extension normalization.

use crate::catalog::MovementNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which movements of a work to select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementSelector {
    /// Movement `n`, or part `n` of composite movements (`1` selects `1-01`..`1-24`).
    Number(u32),
    /// Inclusive range of movements. Against composite movements the pair is
    /// read as `(part, sub)`, so `(1, 1)` selects `1-01` only.
    Range(u32, u32),
    /// Exact hyphenated label such as `"1-01"`.
    Composite(String),
}

impl MovementSelector {
    pub fn matches(&self, movement: Option<&MovementNumber>) -> bool {
        let Some(movement) = movement else {
            return false;
        };

        match (self, movement) {
            (MovementSelector::Number(n), m) => m.primary() == *n,
            (MovementSelector::Range(start, end), MovementNumber::Single(m)) => {
                (*start..=*end).contains(m)
            }
            (MovementSelector::Range(start, end), MovementNumber::Composite { part, sub, .. }) => {
                part == start && sub == end
            }
            (MovementSelector::Composite(label), MovementNumber::Composite { label: stored, .. }) => {
                stored == label
            }
            (MovementSelector::Composite(_), MovementNumber::Single(_)) => false,
        }
    }
}

impl From<u32> for MovementSelector {
    fn from(n: u32) -> Self {
        MovementSelector::Number(n)
    }
}

impl From<(u32, u32)> for MovementSelector {
    fn from((start, end): (u32, u32)) -> Self {
        MovementSelector::Range(start, end)
    }
}

impl From<&str> for MovementSelector {
    /// Plain digits become [`MovementSelector::Number`], anything else is an exact label.
    fn from(label: &str) -> Self {
        match label.parse() {
            Ok(n) => MovementSelector::Number(n),
            Err(_) => MovementSelector::Composite(label.to_string()),
        }
    }
}

impl fmt::Display for MovementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementSelector::Number(n) => write!(f, "{}", n),
            MovementSelector::Range(start, end) => write!(f, "({}, {})", start, end),
            MovementSelector::Composite(label) => f.write_str(label),
        }
    }
}

/// Identifier with `/` separators and no leading or trailing slash.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.replace('\\', "/").trim_matches('/').to_string()
}

/// Extension without the leading dot, lowercased.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// Whether `extension` passes the filter. An empty filter accepts everything.
pub fn extension_allowed(filter: &[&str], extension: &str) -> bool {
    filter.is_empty() || filter.iter().any(|f| normalize_extension(f) == extension)
}
