//! Store error types.
//!
//! Every failure an upload or download can hit maps to exactly one variant,
//! so the HTTP layer can translate it into a status code without string
//! matching.

use std::path::PathBuf;

use super::key::KeyFormatError;
use super::ttl::TtlError;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by admission, persistence, resolution and sweeps.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The requested TTL could not be parsed.
    #[error("invalid deadline: {0}")]
    InvalidDeadline(#[from] TtlError),

    /// Declared upload size is above the configured ceiling.
    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    /// The storage directory already holds the maximum number of files.
    #[error("storage limit exceeded: {count} files (max {max})")]
    StorageFull { count: u64, max: u64 },

    /// Creating or filling the destination file failed.
    #[error("failed to write {key}: {source}")]
    StorageWriteFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Inspecting a stored file failed for a reason other than absence.
    #[error("failed to read {key}: {source}")]
    StorageReadFailed {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The identifier does not follow the storage key grammar.
    #[error("invalid id format: {reason}")]
    InvalidId {
        id: String,
        #[source]
        reason: KeyFormatError,
    },

    /// Well-formed identifier with no file behind it.
    #[error("no stored file for id {0}")]
    NotFound(String),

    /// The storage directory could not be listed.
    #[error("failed to read storage directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn write_failed(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::StorageWriteFailed {
            key: key.into(),
            source,
        }
    }

    pub(crate) fn read_failed(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::StorageReadFailed {
            key: key.into(),
            source,
        }
    }

    pub(crate) fn invalid_id(id: impl Into<String>, reason: KeyFormatError) -> Self {
        Self::InvalidId {
            id: id.into(),
            reason,
        }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the caller, not the server, caused the error.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDeadline(_) | Self::TooLarge { .. } | Self::InvalidId { .. } | Self::NotFound(_)
        )
    }
}
