//! Ephemeral object store.
//!
//! Uploads land as flat files in a single directory. Each filename is a
//! storage key (see [`key`]) carrying the object's identifier and absolute
//! expiration, so the directory listing is the whole index: there is no
//! metadata database and nothing to reconcile on startup.
//!
//! Upload path: [`ObjectStore::admit`] then [`ObjectStore::persist`].
//! Download path: [`ObjectStore::resolve`].
//! Expired files are removed by the [`reaper`](crate::reaper).
//!
//! # Async Usage
//!
//! All operations hit the filesystem synchronously. From async contexts use
//! the `*_async` variants, which run the work on `spawn_blocking`.

mod async_ops;
mod error;
pub mod key;
mod operations;
mod ttl;
mod types;
mod validation;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub use error::StoreError;
pub use key::{KeyFormatError, StorageKey, decode_key, encode_key, generate_id};
pub use ttl::{TtlError, parse_ttl};
pub use types::{Admission, ResolvedObject, StoreConfig, StoredObject};

pub(crate) use validation::looks_like_traversal;

/// Filesystem-backed ephemeral object store.
///
/// # Thread Safety
///
/// `ObjectStore` is `Clone` and can be shared across threads. It holds no
/// lock; concurrent writers never collide because each upload gets a fresh
/// time-ordered identifier and files are created exclusively.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    config: Arc<StoreConfig>,
}

impl ObjectStore {
    /// Opens the store, creating the storage directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir).with_context(|| {
            format!("Failed to create storage directory: {}", config.dir.display())
        })?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Counts files (not directories) currently in storage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirectoryUnreadable`] if listing fails.
    pub fn count_files(&self) -> error::Result<u64> {
        operations::count_files(self.dir())
    }

    /// Decides whether an upload of `size` bytes living for `deadline` may
    /// be stored, with the current time as the admission instant.
    ///
    /// # Errors
    ///
    /// See [`ObjectStore::admit_at`].
    pub fn admit(&self, size: u64, deadline: &str) -> error::Result<Admission> {
        self.admit_at(size, deadline, Utc::now())
    }

    /// Admission with an explicit admission instant.
    ///
    /// Checks run in order and stop at the first failure:
    /// size ceiling, file-count ceiling, TTL syntax. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TooLarge`], [`StoreError::StorageFull`],
    /// [`StoreError::InvalidDeadline`], or [`StoreError::DirectoryUnreadable`].
    ///
    /// # Example
    /// ```no_run
    /// # use tempdrop::store::{ObjectStore, StoreConfig};
    /// let store = ObjectStore::open(StoreConfig::new("/var/tempdrop"))?;
    /// let admission = store.admit(10, "1h")?;
    /// let object = store.persist(admission, &mut &b"0123456789"[..])?;
    /// println!("stored as {}", object.key);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn admit_at(
        &self,
        size: u64,
        deadline: &str,
        now: DateTime<Utc>,
    ) -> error::Result<Admission> {
        operations::admit(&self.config, size, deadline, now)
    }

    /// Stores the bytes of an admitted upload under a fresh storage key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageWriteFailed`] on any I/O failure.
    pub fn persist<R: Read + ?Sized>(
        &self,
        admission: Admission,
        reader: &mut R,
    ) -> error::Result<StoredObject> {
        operations::persist(self.dir(), admission, reader)
    }

    /// Looks up a stored file by the identifier a client sent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] for malformed identifiers (without
    /// touching the filesystem), [`StoreError::NotFound`] when absent.
    pub fn resolve(&self, raw: &str) -> error::Result<ResolvedObject> {
        operations::resolve(self.dir(), raw)
    }
}
