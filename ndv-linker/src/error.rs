//! Error types for ndv-linker
//!
//! Three failure classes with different blast radius:
//! - [`InputError`]: one malformed record, skipped and reported
//! - [`StorageError`]: one video's transaction, rolled back and reported
//! - [`ConfigError`]: fatal, raised before any scoring begins

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Kind of input record, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Video,
    Milestone,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Video => write!(f, "video"),
            RecordKind::Milestone => write!(f, "milestone"),
        }
    }
}

/// Malformed input record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Required field absent or blank
    #[error("{record} {id}: missing required field '{field}'")]
    MissingField {
        record: RecordKind,
        id: i64,
        field: &'static str,
    },

    /// Identifier is not a positive integer
    #[error("{record} has invalid id {id}")]
    InvalidId { record: RecordKind, id: i64 },

    /// Second record carrying an id already seen in the same batch
    #[error("{record} {id} appears more than once")]
    Duplicate { record: RecordKind, id: i64 },

    /// Review file key that does not parse as a video id
    #[error("review file key '{0}' is not a video id")]
    InvalidReviewKey(String),
}

/// Association store failure
#[derive(Debug, Error)]
pub enum StorageError {
    /// Association table could not be created
    #[error("Failed to prepare association table: {0}")]
    Schema(#[source] sqlx::Error),

    /// Replace transaction for one video failed and was rolled back
    #[error("Failed to apply associations for video {video_id}: {source}")]
    Apply {
        video_id: i64,
        #[source]
        source: sqlx::Error,
    },

    /// Reading back one video's associations failed
    #[error("Failed to read associations for video {video_id}: {source}")]
    Read {
        video_id: i64,
        #[source]
        source: sqlx::Error,
    },
}

impl StorageError {
    /// Video the failure is isolated to, if any
    pub fn video_id(&self) -> Option<i64> {
        match self {
            StorageError::Schema(_) => None,
            StorageError::Apply { video_id, .. } | StorageError::Read { video_id, .. } => {
                Some(*video_id)
            }
        }
    }
}

/// Malformed configuration (fatal)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Lexicon content is invalid
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),

    /// Override table content is invalid
    #[error("Invalid override table: {0}")]
    Overrides(String),

    /// Thresholds are out of range
    #[error("Invalid thresholds: {0}")]
    Thresholds(String),

    /// TOML document could not be parsed
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration file could not be read
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error for batch runs
#[derive(Debug, Error)]
pub enum LinkerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Input(#[from] InputError),

    /// ndv-common error (database open, record source queries)
    #[error("Common error: {0}")]
    Common(#[from] ndv_common::Error),

    /// Review file (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for batch operations
pub type LinkerResult<T> = Result<T, LinkerError>;
