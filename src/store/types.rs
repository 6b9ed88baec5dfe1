//! Types shared by the store operations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::key::StorageKey;
use crate::constants;

/// Limits and location of the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Flat directory holding one file per stored object
    pub dir: PathBuf,
    /// Largest accepted upload, in bytes
    pub max_file_size_bytes: u64,
    /// Admission refuses new uploads once this many files exist
    pub max_total_files: u64,
}

impl StoreConfig {
    /// Creates a config for `dir` with the default limits.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size_bytes: constants::DEFAULT_MAX_FILE_SIZE_MB * constants::BYTES_PER_MB,
            max_total_files: constants::DEFAULT_MAX_TOTAL_FILES,
        }
    }

    #[must_use]
    pub const fn with_max_file_size_bytes(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_total_files(mut self, count: u64) -> Self {
        self.max_total_files = count;
        self
    }
}

/// A positive admission decision.
///
/// Only [`ObjectStore::admit`](super::ObjectStore::admit) hands these out,
/// and [`ObjectStore::persist`](super::ObjectStore::persist) consumes one per
/// stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an admission does nothing until it is persisted"]
pub struct Admission {
    pub(crate) size: u64,
    pub(crate) deadline: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) expires_at: i64,
}

impl Admission {
    /// Declared size the upload was admitted with.
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// TTL expression exactly as the client sent it.
    pub fn deadline(&self) -> &str {
        &self.deadline
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Absolute expiration, unix seconds.
    pub const fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Descriptor of a persisted upload, returned to the uploader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    /// Time-ordered unique identifier
    pub id: Uuid,
    /// Filename in the storage directory, also the download identifier
    pub key: StorageKey,
    pub created_at: DateTime<Utc>,
    /// TTL expression echoed back, not re-parsed
    pub deadline: String,
    /// Absolute expiration, unix seconds
    pub expires_at: i64,
    /// Bytes actually written
    pub size: u64,
}

/// A download target that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedObject {
    pub key: StorageKey,
    pub path: PathBuf,
    pub size: u64,
}
