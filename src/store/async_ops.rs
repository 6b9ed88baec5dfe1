//! Async wrappers for store operations.
//!
//! These wrap the synchronous operations in `spawn_blocking` so directory
//! listings and byte copies never stall the async runtime. Use them from
//! HTTP handlers and other async contexts.

use std::io::Read;

use super::ObjectStore;
use super::error::Result;
use super::types::{Admission, ResolvedObject, StoredObject};

impl ObjectStore {
    /// Async version of `admit`.
    pub async fn admit_async(&self, size: u64, deadline: String) -> Result<Admission> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.admit(size, &deadline)).await?
    }

    /// Async version of `persist`.
    ///
    /// Takes the reader by value since it moves onto the blocking pool.
    pub async fn persist_async<R>(&self, admission: Admission, mut reader: R) -> Result<StoredObject>
    where
        R: Read + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.persist(admission, &mut reader)).await?
    }

    /// Async version of `resolve`.
    pub async fn resolve_async(&self, raw: String) -> Result<ResolvedObject> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.resolve(&raw)).await?
    }
}
