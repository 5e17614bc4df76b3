//! Pluggable storage backend contract.

use std::future::Future;

use bytes::Bytes;

use super::error::StorageError;
use crate::file::{FileHandle, FileLocation};

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Durable identifier; this is what the host record persists.
    pub identifier: String,
    /// Content type carried over from the cached file.
    pub content_type: Option<String>,
    /// Original filename carried over from the cached file.
    pub original_filename: String,
    /// Stored size in bytes.
    pub size: u64,
}

impl From<StoredFile> for FileHandle {
    fn from(stored: StoredFile) -> Self {
        Self {
            location: FileLocation::Stored {
                identifier: stored.identifier,
            },
            content_type: stored.content_type,
            original_filename: stored.original_filename,
            size: Some(stored.size),
        }
    }
}

/// Durable store for committed files.
///
/// Backends hold no per-attachment state and must tolerate concurrent calls
/// on different identifiers.
pub trait StorageBackend: Send + Sync {
    /// Commit a file whose bytes live in the cache medium.
    fn store(
        &self,
        file: &FileHandle,
    ) -> impl Future<Output = Result<StoredFile, StorageError>> + Send;

    /// Load the handle for a committed file.
    ///
    /// Fails with [`StorageError::NotFound`] when nothing is stored under
    /// `identifier`.
    fn retrieve(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<FileHandle, StorageError>> + Send;

    /// Delete a committed file.
    ///
    /// Each backend documents whether an already-absent entry is a success
    /// or a [`StorageError::NotFound`].
    fn remove(&self, identifier: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Read the bytes of a committed file.
    fn read(&self, identifier: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
