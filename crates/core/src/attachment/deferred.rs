//! Rebuilding a cached file from persisted record fields.
//!
//! A deferred commit runs without the original upload. Everything it needs
//! was written onto the record before save: the cache name, the content type
//! and the original filename.

use tracing::debug;

use super::error::{AttachmentError, CacheAssignmentError};
use super::record::HostRecord;
use crate::cache::{CacheId, CacheStore};
use crate::file::FileHandle;

/// Rebuilds file handles for deferred commits.
#[derive(Debug, Clone, Copy)]
pub struct DeferredCommitBridge<'a> {
    cache: &'a CacheStore,
}

impl<'a> DeferredCommitBridge<'a> {
    /// Create a bridge resolving cache names against `cache`.
    #[must_use]
    pub fn new(cache: &'a CacheStore) -> Self {
        Self { cache }
    }

    /// Whether the record carries any reconstruction field for `column`.
    ///
    /// A record with none of them has nothing pending.
    #[must_use]
    pub fn has_pending<R: HostRecord + ?Sized>(record: &R, column: &str) -> bool {
        [
            record.read_cache_name(column),
            record.read_content_type(column),
            record.read_original_filename(column),
        ]
        .iter()
        .any(|field| present(field.as_deref()).is_some())
    }

    /// Rebuild the cached file handle and its identifier from `record`.
    ///
    /// The caller is responsible for checking
    /// [`HostRecord::is_deferred_commit`] first.
    ///
    /// # Errors
    ///
    /// - [`AttachmentError::CacheAssignment`] naming every missing or empty field
    /// - [`AttachmentError::InvalidCacheName`] if the cache name is malformed
    pub fn reconstruct<R: HostRecord + ?Sized>(
        &self,
        record: &R,
        column: &str,
    ) -> Result<(CacheId, FileHandle), AttachmentError> {
        let cache_name = record.read_cache_name(column);
        let content_type = record.read_content_type(column);
        let original_filename = record.read_original_filename(column);

        let mut missing = Vec::new();
        let cache_name = present(cache_name.as_deref()).or_else(|| {
            missing.push("cache_name");
            None
        });
        let content_type = present(content_type.as_deref()).or_else(|| {
            missing.push("content_type");
            None
        });
        let original_filename = present(original_filename.as_deref()).or_else(|| {
            missing.push("original_filename");
            None
        });

        let (Some(cache_name), Some(content_type), Some(original_filename)) =
            (cache_name, content_type, original_filename)
        else {
            return Err(CacheAssignmentError {
                column: column.to_string(),
                missing,
            }
            .into());
        };

        let id = CacheId::parse(cache_name)?;
        let handle = self.cache.handle_for(
            id.clone(),
            Some(content_type.to_string()),
            original_filename,
        );

        debug!(%column, cache_id = %id, "cached file reconstructed from record");
        Ok((id, handle))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::CacheFields;
    use crate::file::FileLocation;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Record {
        fields: Option<CacheFields>,
        partial: [Option<String>; 3],
    }

    impl HostRecord for Record {
        fn record_ref(&self) -> String {
            "record:1".to_string()
        }

        fn read_identifier(&self, _column: &str) -> Option<String> {
            None
        }

        fn write_identifier(&mut self, _column: &str, _identifier: Option<&str>) {}

        fn is_deferred_commit(&self) -> bool {
            true
        }

        fn read_cache_name(&self, _column: &str) -> Option<String> {
            self.fields
                .as_ref()
                .map(|f| f.cache_name.clone())
                .or_else(|| self.partial[0].clone())
        }

        fn read_content_type(&self, _column: &str) -> Option<String> {
            self.fields
                .as_ref()
                .map(|f| f.content_type.clone())
                .or_else(|| self.partial[1].clone())
        }

        fn read_original_filename(&self, _column: &str) -> Option<String> {
            self.fields
                .as_ref()
                .map(|f| f.original_filename.clone())
                .or_else(|| self.partial[2].clone())
        }
    }

    #[test]
    fn test_reconstruct_uses_all_three_fields() {
        let cache = CacheStore::new("/var/cache/stowage");
        let record = Record {
            fields: Some(CacheFields {
                cache_name: "ab12/avatar.png".to_string(),
                content_type: "image/png".to_string(),
                original_filename: "avatar.png".to_string(),
            }),
            ..Record::default()
        };

        let (id, handle) = DeferredCommitBridge::new(&cache)
            .reconstruct(&record, "avatar")
            .expect("reconstructed");

        assert_eq!(id.dir(), "ab12");
        assert_eq!(id.filename(), "avatar.png");
        assert_eq!(handle.content_type.as_deref(), Some("image/png"));
        assert_eq!(handle.original_filename, "avatar.png");
        assert_eq!(
            handle.location,
            FileLocation::Cached {
                id,
                path: PathBuf::from("/var/cache/stowage/ab12/avatar.png"),
            }
        );
    }

    #[test]
    fn test_reconstruct_names_every_missing_field() {
        let cache = CacheStore::new("/var/cache/stowage");
        let record = Record {
            partial: [Some("ab12/avatar.png".to_string()), Some("  ".to_string()), None],
            ..Record::default()
        };

        let err = DeferredCommitBridge::new(&cache)
            .reconstruct(&record, "avatar")
            .unwrap_err();

        match err {
            AttachmentError::CacheAssignment(e) => {
                assert_eq!(e.column, "avatar");
                assert_eq!(e.missing, vec!["content_type", "original_filename"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reconstruct_rejects_malformed_cache_name() {
        let cache = CacheStore::new("/var/cache/stowage");
        let record = Record {
            fields: Some(CacheFields {
                cache_name: "avatar.png".to_string(),
                content_type: "image/png".to_string(),
                original_filename: "avatar.png".to_string(),
            }),
            ..Record::default()
        };

        let err = DeferredCommitBridge::new(&cache)
            .reconstruct(&record, "avatar")
            .unwrap_err();
        assert!(matches!(err, AttachmentError::InvalidCacheName(_)));
    }

    #[test]
    fn test_has_pending() {
        assert!(!DeferredCommitBridge::has_pending(&Record::default(), "avatar"));

        let partial = Record {
            partial: [None, Some("image/png".to_string()), None],
            ..Record::default()
        };
        assert!(DeferredCommitBridge::has_pending(&partial, "avatar"));
    }
}
