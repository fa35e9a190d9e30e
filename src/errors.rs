//! Custom error types for the ipscore analyzer.
//!
//! Only the input gatherers and CLI setup can fail. The scoring engine itself
//! is total over its inputs and never returns these.

use std::path::PathBuf;

/// The main error type for ipscore operations.
#[derive(Debug, thiserror::Error)]
pub enum IpScoreError {
    /// I/O error (input record or tables file read/write)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Address that is not a dotted-quad IPv4
    #[error("Invalid IPv4 address: {0}")]
    InvalidIp(String),

    /// Scoring tables file is structurally unusable
    #[error("Invalid scoring tables: {0}")]
    Tables(String),

    /// A threat feed lookup failed
    #[error("Threat feed '{source_name}' failed: {message}")]
    Feed {
        source_name: String,
        message: String,
    },

    /// Tokio task join error
    #[error("Async task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Generic error for external library errors
    #[error("{context}: {message}")]
    External { context: String, message: String },
}

/// Result type alias using IpScoreError
pub type IpScoreResult<T> = Result<T, IpScoreError>;

impl IpScoreError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a feed error for a named threat source
    pub fn feed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Feed {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an external error with context
    pub fn external(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for IpScoreError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}
