//! Cache medium on the local filesystem.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use stowage_shared::CacheConfig;
use tracing::{debug, info, instrument, warn};

use super::id::{CacheId, token_timestamp};
use crate::attachment::AttachmentError;
use crate::file::{DEFAULT_CONTENT_TYPE, FileHandle, Upload};

/// Writes uploads into uniquely named cache directories.
///
/// Layout: `<root>/<cache_dir>/<filename>`. The store is shared by every
/// attachment; distinct identifiers never touch the same directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a cache store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a cache store from configuration.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.root.clone())
    }

    /// Root directory of the cache medium.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the bytes for `id`.
    #[must_use]
    pub fn path_for(&self, id: &CacheId) -> PathBuf {
        self.root.join(id.dir()).join(id.filename())
    }

    /// Handle for an existing cache entry, stamped with the given metadata.
    #[must_use]
    pub fn handle_for(
        &self,
        id: CacheId,
        content_type: Option<String>,
        original_filename: impl Into<String>,
    ) -> FileHandle {
        let path = self.path_for(&id);
        FileHandle::cached(id, path, content_type, original_filename)
    }

    /// Write `upload` into a fresh cache entry.
    ///
    /// # Errors
    ///
    /// - [`AttachmentError::EmptyUpload`] if the upload has no bytes
    /// - [`AttachmentError::InvalidUpload`] if the filename is unusable
    /// - [`AttachmentError::Cache`] if the cache medium cannot be written
    #[instrument(skip(self, upload), fields(filename = upload.original_filename()))]
    pub async fn cache(&self, upload: &Upload) -> Result<(CacheId, FileHandle), AttachmentError> {
        if upload.is_empty() {
            return Err(AttachmentError::EmptyUpload);
        }

        let id = CacheId::generate(upload.original_filename())?;
        let dir = self.root.join(id.dir());

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(AttachmentError::Cache)?;
        // create_dir, not create_dir_all: an existing directory means a token collision.
        tokio::fs::create_dir(&dir)
            .await
            .map_err(AttachmentError::Cache)?;

        let path = dir.join(id.filename());
        tokio::fs::write(&path, upload.bytes())
            .await
            .map_err(AttachmentError::Cache)?;

        let size = upload.bytes().len() as u64;
        debug!(cache_id = %id, size, "upload cached");

        let handle = FileHandle::cached(
            id.clone(),
            path,
            Some(
                upload
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string(),
            ),
            upload.original_filename(),
        )
        .with_size(size);

        Ok((id, handle))
    }

    /// Remove cache directories older than `max_age`.
    ///
    /// Entries whose name is not a generated cache token are left alone.
    /// Returns the number of directories removed.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::Cache`] if the cache root cannot be listed
    /// or an expired entry cannot be removed.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn clean(&self, max_age: Duration) -> Result<usize, AttachmentError> {
        let Some(cutoff) = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AttachmentError::Cache(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await.map_err(AttachmentError::Cache)? {
            let name = entry.file_name();
            let Some(created_at) = name.to_str().and_then(token_timestamp) else {
                continue;
            };
            if created_at >= cutoff {
                continue;
            }
            if !entry.file_type().await.map_err(AttachmentError::Cache)?.is_dir() {
                warn!(entry = ?name, "unexpected file in cache root");
                continue;
            }

            tokio::fs::remove_dir_all(entry.path())
                .await
                .map_err(AttachmentError::Cache)?;
            removed += 1;
        }

        info!(removed, "cache sweep finished");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_writes_bytes_under_identifier() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());
        let upload = Upload::new(&b"\x89PNG"[..], "my avatar.png").with_content_type("image/png");

        let (id, handle) = store.cache(&upload).await.expect("cached");

        assert_eq!(id.filename(), "my_avatar.png");
        assert_eq!(handle.cache_id(), Some(&id));
        assert_eq!(handle.content_type.as_deref(), Some("image/png"));
        assert_eq!(handle.original_filename, "my avatar.png");
        assert_eq!(handle.size, Some(4));

        let on_disk = tokio::fs::read(store.path_for(&id)).await.expect("read");
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_cache_defaults_missing_content_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());

        let (_, handle) = store
            .cache(&Upload::new(&b"%PDF"[..], "report.pdf"))
            .await
            .expect("cached");

        assert_eq!(handle.content_type.as_deref(), Some(DEFAULT_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_cache_rejects_empty_upload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());

        let err = store
            .cache(&Upload::new(Vec::new(), "empty.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::EmptyUpload));
    }

    #[tokio::test]
    async fn test_concurrent_caches_get_distinct_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());
        let upload = Upload::new(&b"same bytes"[..], "same.txt");

        let results =
            futures::future::join_all((0..32).map(|_| store.cache(&upload))).await;

        let mut ids: Vec<String> = results
            .into_iter()
            .map(|r| r.expect("cached").0.to_string())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn test_clean_removes_only_expired_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path());

        let stale = dir.path().join("1000000000-1-0001");
        tokio::fs::create_dir_all(&stale).await.expect("mkdir");
        tokio::fs::write(stale.join("old.txt"), b"old").await.expect("write");
        tokio::fs::create_dir_all(dir.path().join("keep-me"))
            .await
            .expect("mkdir");
        let (fresh, _) = store
            .cache(&Upload::new(&b"new"[..], "new.txt"))
            .await
            .expect("cached");

        let removed = store.clean(Duration::from_secs(3600)).await.expect("swept");

        assert_eq!(removed, 1);
        assert!(!stale.exists());
        assert!(dir.path().join("keep-me").exists());
        assert!(store.path_for(&fresh).exists());
    }

    #[tokio::test]
    async fn test_clean_missing_root_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CacheStore::new(dir.path().join("absent"));
        assert_eq!(store.clean(Duration::from_secs(1)).await.expect("ok"), 0);
    }
}
