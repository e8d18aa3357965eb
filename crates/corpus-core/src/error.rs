//! Error types for the corpus library.
//!
//! Resolution, index build and search each surface their own variants so
//! callers can tell "nothing matched" apart from "the query was malformed".

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the corpus library.
#[derive(Debug, Error)]
pub enum CorpusError {
    // Resolution errors
    #[error("No work matches identifier: {identifier}")]
    NotFound { identifier: String },

    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    // Index build errors
    #[error("Failed to parse {source_path}: {message}")]
    Parse {
        source_path: String,
        message: String,
    },

    #[error("No parser registered for extension: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Index build cancelled")]
    Cancelled,

    // Search errors
    #[error("Invalid search pattern {pattern:?}: {source}")]
    InvalidQuery {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // Network errors
    #[error("Failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;

impl From<std::io::Error> for CorpusError {
    fn from(err: std::io::Error) -> Self {
        CorpusError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for CorpusError {
    fn from(err: serde_json::Error) -> Self {
        CorpusError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for CorpusError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CorpusError::Timeout(std::time::Duration::from_secs(0))
        } else {
            CorpusError::Network {
                url: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "<unknown>".to_string()),
                message: err.to_string(),
            }
        }
    }
}

impl CorpusError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CorpusError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a parse error for a source path.
    pub fn parse(source_path: impl Into<String>, message: impl Into<String>) -> Self {
        CorpusError::Parse {
            source_path: source_path.into(),
            message: message.into(),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Connection failures and timeouts are transient. Of the HTTP statuses,
    /// only 408, 429 and 5xx are worth asking again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CorpusError::Network { .. } | CorpusError::Timeout(_) => true,
            CorpusError::HttpStatus { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Whether a failure on one entry should only skip that entry during a build.
    ///
    /// Cancellation is the one condition that aborts the whole build.
    pub fn is_per_entry(&self) -> bool {
        !matches!(self, CorpusError::Cancelled)
    }
}
