//! Upload sources and file handles.

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::attachment::AttachmentError;
use crate::cache::CacheId;

/// Content type recorded for uploads that arrive without one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An incoming upload: bytes plus the metadata the client sent with them.
#[derive(Debug, Clone)]
pub struct Upload {
    bytes: Bytes,
    original_filename: String,
    content_type: Option<String>,
}

impl Upload {
    /// Create an upload from in-memory bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, original_filename: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            original_filename: original_filename.into(),
            content_type: None,
        }
    }

    /// Set the content type reported by the client.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read an upload from a file on disk.
    ///
    /// The original filename is the last component of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::UnreadableUpload`] if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::UnreadableUpload {
                path: path.to_path_buf(),
                source,
            })?;
        let original_filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self::new(bytes, original_filename))
    }

    /// Raw upload bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Filename as sent by the client, unsanitized.
    #[must_use]
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Content type as sent by the client.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether the upload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where the bytes behind a [`FileHandle`] live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLocation {
    /// Inside the cache medium, awaiting commit.
    Cached {
        /// Cache identifier of the entry.
        id: CacheId,
        /// Absolute or cache-root-relative path of the cached bytes.
        path: PathBuf,
    },
    /// Inside a storage backend.
    Stored {
        /// Backend identifier as persisted on the host record.
        identifier: String,
    },
}

/// Reference to a cache-scoped or storage-scoped file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Where the bytes live.
    pub location: FileLocation,
    /// Content type, if known.
    pub content_type: Option<String>,
    /// Original filename as uploaded.
    pub original_filename: String,
    /// Size in bytes, if known.
    pub size: Option<u64>,
}

impl FileHandle {
    /// Handle for a cache entry.
    #[must_use]
    pub fn cached(
        id: CacheId,
        path: PathBuf,
        content_type: Option<String>,
        original_filename: impl Into<String>,
    ) -> Self {
        Self {
            location: FileLocation::Cached { id, path },
            content_type,
            original_filename: original_filename.into(),
            size: None,
        }
    }

    /// Attach a known size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Cache identifier, when the handle points into the cache medium.
    #[must_use]
    pub fn cache_id(&self) -> Option<&CacheId> {
        match &self.location {
            FileLocation::Cached { id, .. } => Some(id),
            FileLocation::Stored { .. } => None,
        }
    }

    /// Path of the cached bytes, when the handle points into the cache medium.
    #[must_use]
    pub fn cache_path(&self) -> Option<&Path> {
        match &self.location {
            FileLocation::Cached { path, .. } => Some(path),
            FileLocation::Stored { .. } => None,
        }
    }

    /// Backend identifier, when the handle points into storage.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        match &self.location {
            FileLocation::Cached { .. } => None,
            FileLocation::Stored { identifier } => Some(identifier),
        }
    }

    /// Whether the bytes still live in the cache medium.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        matches!(self.location, FileLocation::Cached { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.pdf");
        tokio::fs::write(&path, b"%PDF-1.7").await.expect("write");

        let upload = Upload::from_path(&path).await.expect("readable");
        assert_eq!(upload.original_filename(), "report.pdf");
        assert_eq!(upload.bytes().as_ref(), b"%PDF-1.7");
        assert_eq!(upload.content_type(), None);
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Upload::from_path(dir.path().join("nope.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::UnreadableUpload { .. }));
    }

    #[test]
    fn test_handle_accessors() {
        let id = CacheId::parse("1700000000-42-0001/avatar.png").expect("valid id");
        let handle = FileHandle::cached(
            id.clone(),
            PathBuf::from("/cache/1700000000-42-0001/avatar.png"),
            Some("image/png".to_string()),
            "avatar.png",
        );
        assert!(handle.is_cached());
        assert_eq!(handle.cache_id(), Some(&id));
        assert_eq!(handle.identifier(), None);

        let stored = FileHandle {
            location: FileLocation::Stored {
                identifier: id.to_string(),
            },
            ..handle
        };
        assert!(!stored.is_cached());
        assert_eq!(stored.identifier(), Some("1700000000-42-0001/avatar.png"));
    }
}
