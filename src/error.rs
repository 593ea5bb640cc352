//! Error taxonomy shared by every activity persistence operation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ActivityError>;

/// Failures surfaced by the activity persistence layer.
///
/// Nothing in this crate recovers from these locally: every variant is fatal
/// for the operation that produced it and is handed straight to the caller.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Create/read/write on a backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A watermark file exists but does not hold a base-10 integer.
    #[error("malformed aggregation watermark in {path}: {contents:?}")]
    MalformedWatermark { path: PathBuf, contents: String },

    /// A primitive or composite storage failed to initialise.
    #[error("failed to initialise {target}: {reason}")]
    Initialization { target: String, reason: String },

    /// A storage handle was used before `init()` succeeded.
    #[error("{target} used before init()")]
    NotInitialized { target: String },

    /// A document index does not fit the addressable size of a column.
    #[error("{target} cannot address document index {index}")]
    CapacityExceeded { target: String, index: usize },

    #[error("invalid activity field name {name:?}")]
    InvalidFieldName { name: String },

    #[error("invalid activity configuration: {reason}")]
    Config { reason: String },

    #[error("directory metadata at {path} is corrupted: {reason}")]
    MetadataCorrupted { path: PathBuf, reason: String },
}

impl ActivityError {
    pub(crate) fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn init(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Initialization {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error was raised by an underlying storage `init()`.
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = ActivityError::io(
            "/data/clicks.aggregates",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/data/clicks.aggregates"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn malformed_watermark_quotes_contents() {
        let err = ActivityError::MalformedWatermark {
            path: PathBuf::from("score.aggregates"),
            contents: "abc".into(),
        };
        assert!(err.to_string().contains("\"abc\""));
        assert!(!err.is_initialization());
    }
}
