//! Attachment error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Deferred reconstruction found required record fields missing or empty.
///
/// This is a host configuration error, never a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot reconstruct cached file for `{column}`: missing {}", .missing.join(", "))]
pub struct CacheAssignmentError {
    /// Mount column the reconstruction was for.
    pub column: String,
    /// Names of the missing fields.
    pub missing: Vec<&'static str>,
}

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Upload has no bytes.
    #[error("upload is empty")]
    EmptyUpload,

    /// Upload metadata is unusable.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// Upload source could not be read.
    #[error("cannot read upload {}: {source}", .path.display())]
    UnreadableUpload {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Cache medium operation failed.
    #[error("cache error: {0}")]
    Cache(#[source] std::io::Error),

    /// Cache name does not have the `<cache_dir>/<filename>` shape.
    #[error("invalid cache name: {0:?}")]
    InvalidCacheName(String),

    /// Deferred reconstruction failed.
    #[error(transparent)]
    CacheAssignment(#[from] CacheAssignmentError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Deferred commit could not be enqueued.
    #[error("queue error: {0}")]
    Queue(String),
}

impl AttachmentError {
    /// Create a queue error.
    #[must_use]
    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue(msg.into())
    }
}
