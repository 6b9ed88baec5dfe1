//! Core store operations: count, admit, persist and resolve.
//!
//! The storage directory is the only index. Every call re-reads it, and the
//! filesystem arbitrates between concurrent uploads, downloads and sweeps.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::error::{Result, StoreError};
use super::key::{StorageKey, generate_id};
use super::ttl::parse_ttl;
use super::types::{Admission, ResolvedObject, StoreConfig, StoredObject};
use super::validation::object_path;

/// Counts non-directory entries in `dir`.
///
/// # Errors
///
/// Returns [`StoreError::DirectoryUnreadable`] if the directory or one of
/// its entries cannot be read. Entries that vanish mid-count are skipped.
pub(crate) fn count_files(dir: &Path) -> Result<u64> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::unreadable(dir, e))?;

    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::unreadable(dir, e))?;
        if counts_as_file(&entry.path(), entry.file_type())? {
            count += 1;
        }
    }

    Ok(count)
}

/// Whether a directory entry counts toward capacity.
///
/// An entry that disappeared between readdir and lstat (removed by a
/// concurrent sweep) counts as absent.
pub(crate) fn counts_as_file(path: &Path, file_type: io::Result<fs::FileType>) -> Result<bool> {
    match file_type {
        Ok(file_type) => Ok(!file_type.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::unreadable(path, e)),
    }
}

/// Runs the admission checks in order: size, capacity, TTL.
///
/// The capacity check is a snapshot. Concurrent admissions near the ceiling
/// can each pass it, so the file count may briefly exceed the limit.
///
/// # Errors
///
/// - [`StoreError::TooLarge`] if `size` exceeds the configured ceiling
/// - [`StoreError::StorageFull`] if the directory is at capacity
/// - [`StoreError::InvalidDeadline`] if `deadline` does not parse
/// - [`StoreError::DirectoryUnreadable`] if the capacity count fails
pub(crate) fn admit(
    config: &StoreConfig,
    size: u64,
    deadline: &str,
    now: DateTime<Utc>,
) -> Result<Admission> {
    if size > config.max_file_size_bytes {
        return Err(StoreError::TooLarge {
            size,
            max: config.max_file_size_bytes,
        });
    }

    let count = count_files(&config.dir)?;
    if count >= config.max_total_files {
        return Err(StoreError::StorageFull {
            count,
            max: config.max_total_files,
        });
    }

    let ttl = parse_ttl(deadline)?;
    let expires_at = expiry_after(now, ttl);

    debug!(size, deadline, expires_at, "Upload admitted");

    Ok(Admission {
        size,
        deadline: deadline.to_string(),
        created_at: now,
        expires_at,
    })
}

/// Absolute expiry in unix seconds: `now + ttl`, floored after the addition.
///
/// Saturates at `i64::MAX` when the sum is not representable.
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> i64 {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map_or(i64::MAX, |expires| expires.timestamp())
}

/// Writes `reader` to a freshly named file and returns its descriptor.
///
/// The file is created with `create_new`, so an existing name is an error
/// rather than an overwrite. On a failed copy the partial file is removed on
/// a best-effort basis.
///
/// # Errors
///
/// Returns [`StoreError::StorageWriteFailed`] if the file cannot be created,
/// written or synced.
pub(crate) fn persist<R: Read + ?Sized>(
    dir: &Path,
    admission: Admission,
    reader: &mut R,
) -> Result<StoredObject> {
    let key = StorageKey::new(generate_id(), admission.expires_at);
    persist_as(dir, key, admission, reader)
}

/// Writes `reader` under an already chosen storage key.
///
/// Fails with [`StoreError::StorageWriteFailed`] if a file with that name
/// exists, leaving the existing file untouched.
pub(crate) fn persist_as<R: Read + ?Sized>(
    dir: &Path,
    key: StorageKey,
    admission: Admission,
    reader: &mut R,
) -> Result<StoredObject> {
    let id = key.id();
    let name = key.to_string();
    let path = dir.join(&name);

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| StoreError::write_failed(&name, e))?;

    let copied = io::copy(reader, &mut file)
        .and_then(|n| file.flush().and_then(|()| file.sync_all()).map(|()| n));

    let size = match copied {
        Ok(n) => n,
        Err(e) => {
            drop(file);
            if let Err(rm) = fs::remove_file(&path) {
                warn!(key = %name, error = %rm, "Failed to remove partial upload");
            }
            return Err(StoreError::write_failed(name, e));
        },
    };

    info!(
        key = %name,
        size,
        deadline = %admission.deadline,
        expires_at = admission.expires_at,
        "Received new file"
    );

    Ok(StoredObject {
        id,
        key,
        created_at: admission.created_at,
        deadline: admission.deadline,
        expires_at: admission.expires_at,
        size,
    })
}

/// Maps a raw identifier to an existing file.
///
/// Expiration is not checked here. A file past its deadline stays servable
/// until a sweep removes it.
///
/// # Errors
///
/// - [`StoreError::InvalidId`] before any filesystem access if `raw` is malformed
/// - [`StoreError::NotFound`] if no regular file carries that name
/// - [`StoreError::StorageReadFailed`] if the file cannot be inspected
pub(crate) fn resolve(dir: &Path, raw: &str) -> Result<ResolvedObject> {
    let (key, path) = object_path(dir, raw)?;

    match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(ResolvedObject {
            key,
            path,
            size: meta.len(),
        }),
        Ok(_) => Err(StoreError::NotFound(raw.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(raw.to_string())),
        Err(e) => Err(StoreError::read_failed(raw, e)),
    }
}
