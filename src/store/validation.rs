//! Identifier validation for downloads.
//!
//! Client-supplied identifiers end up joined onto the storage directory, so
//! they are checked against the storage key grammar before any filesystem
//! call. The grammar admits only hex digits, hyphens and decimal digits,
//! which rules out separators, `..`, absolute paths and drive prefixes.

use std::path::{Component, Path, PathBuf};

use super::error::{Result, StoreError};
use super::key::{StorageKey, decode_key};

/// Validates a raw identifier and returns its decoded key.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] when `raw` is not a storage key.
pub(crate) fn validate_key(raw: &str) -> Result<StorageKey> {
    decode_key(raw).map_err(|reason| StoreError::invalid_id(raw, reason))
}

/// Returns the on-disk path for a raw identifier.
///
/// Joins the identifier as given (not re-encoded) so the lookup hits exactly
/// the filename the client named.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] when `raw` is not a storage key.
pub(crate) fn object_path(dir: &Path, raw: &str) -> Result<(StorageKey, PathBuf)> {
    let key = validate_key(raw)?;

    let name = Path::new(raw);
    debug_assert!(
        matches!(
            name.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        ),
        "validated key must be a single path component"
    );

    Ok((key, dir.join(name)))
}

/// Returns true if `raw` looks like an attempt to escape the storage
/// directory rather than a simple typo.
pub(crate) fn looks_like_traversal(raw: &str) -> bool {
    raw.contains("..") || raw.contains('/') || raw.contains('\\') || raw.contains('\0')
}
