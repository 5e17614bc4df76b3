//! Mount points: binding one record column to a cache, a backend and options.
//!
//! A mount replaces the save and destroy callbacks an ORM would register:
//! the host calls [`Mount::before_save`], [`Mount::after_save`] and
//! [`Mount::after_destroy`] from its own persistence hooks.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::deferred::DeferredCommitBridge;
use super::error::AttachmentError;
use super::hooks::{AttachmentHooks, NoHooks};
use super::record::HostRecord;
use super::slot::AttachmentSlot;
use super::types::{CacheFields, DeferredCommit, ErrorFlags, MountOptions};
use super::validation::{ValidationGate, ValidationResult};
use crate::cache::CacheStore;
use crate::file::DEFAULT_CONTENT_TYPE;
use crate::storage::{StorageBackend, StoredFile};

/// Queue that runs deferred commits out of process.
pub trait CommitQueue: Send + Sync {
    /// Schedule `job`. The worker later calls [`Mount::commit_deferred`].
    fn enqueue(
        &self,
        job: DeferredCommit,
    ) -> impl Future<Output = Result<(), AttachmentError>> + Send;
}

/// What [`Mount::after_save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The cached file was committed inline.
    Stored(StoredFile),
    /// The commit was handed to the queue.
    Deferred(DeferredCommit),
    /// Nothing was pending.
    Unchanged,
}

/// One column of one record type with attachment behavior.
pub struct Mount<B> {
    column: String,
    options: MountOptions,
    cache: Arc<CacheStore>,
    storage: Arc<B>,
    hooks: Arc<dyn AttachmentHooks>,
}

impl<B: StorageBackend> Mount<B> {
    /// Mount `column` with the given cache medium and backend.
    #[must_use]
    pub fn new(
        column: impl Into<String>,
        options: MountOptions,
        cache: Arc<CacheStore>,
        storage: Arc<B>,
    ) -> Self {
        Self {
            column: column.into(),
            options,
            cache,
            storage,
            hooks: Arc::new(NoHooks),
        }
    }

    /// Install lifecycle hooks on every slot this mount creates.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn AttachmentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Mounted column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Mount options.
    #[must_use]
    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    /// Slot for `record`, primed with its persisted identifier.
    #[must_use]
    pub fn slot<R: HostRecord + ?Sized>(&self, record: &R) -> AttachmentSlot<B> {
        AttachmentSlot::new(
            self.column.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.storage),
        )
        .with_hooks(Arc::clone(&self.hooks))
        .with_stored_identifier(record.read_identifier(&self.column))
    }

    /// Run the configured validation gate against the record's flags.
    #[must_use]
    pub fn validate<R: HostRecord + ?Sized>(&self, record: &R) -> ValidationResult {
        ValidationGate::from_options(&self.options)
            .check(ErrorFlags::from_record(record, &self.column))
    }

    /// Sync the slot onto the record before it is persisted.
    ///
    /// Writes the stored identifier. For deferred-commit records with a
    /// pending cache entry, also writes the three fields the worker needs.
    pub fn before_save<R: HostRecord + ?Sized>(&self, slot: &AttachmentSlot<B>, record: &mut R) {
        record.write_identifier(&self.column, slot.stored_identifier());

        if !record.is_deferred_commit() {
            return;
        }
        if let (Some(id), Some(file)) = (slot.cache_id(), slot.file()) {
            let fields = CacheFields {
                cache_name: id.to_string(),
                content_type: file
                    .content_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                original_filename: file.original_filename.clone(),
            };
            record.write_cache_fields(&self.column, Some(&fields));
        }
    }

    /// Commit or enqueue the pending cache entry after the record is saved.
    #[instrument(skip_all, fields(column = %self.column))]
    pub async fn after_save<R, Q>(
        &self,
        slot: &mut AttachmentSlot<B>,
        record: &mut R,
        queue: &Q,
    ) -> Result<SaveOutcome, AttachmentError>
    where
        R: HostRecord + ?Sized,
        Q: CommitQueue,
    {
        let Some(cache_id) = slot.cache_id() else {
            return Ok(SaveOutcome::Unchanged);
        };

        if record.is_deferred_commit() {
            let job = DeferredCommit {
                record_ref: record.record_ref(),
                column: self.column.clone(),
                cache_name: cache_id.to_string(),
            };
            queue.enqueue(job.clone()).await?;
            info!(record = %job.record_ref, cache_name = %job.cache_name, "commit deferred");
            return Ok(SaveOutcome::Deferred(job));
        }

        Ok(slot
            .store(None, record)
            .await?
            .map_or(SaveOutcome::Unchanged, SaveOutcome::Stored))
    }

    /// Remove the committed file once the record is destroyed.
    ///
    /// # Errors
    ///
    /// Storage failures propagate.
    pub async fn after_destroy<R: HostRecord + ?Sized>(
        &self,
        slot: &mut AttachmentSlot<B>,
        record: &mut R,
    ) -> Result<bool, AttachmentError> {
        slot.remove(record).await
    }

    /// Worker side of a deferred commit: rebuild `job` from `record` and commit.
    ///
    /// A record that already points at `job.cache_name` was committed by an
    /// earlier run and yields `None`. Otherwise the record must carry all
    /// three reconstruction fields.
    ///
    /// # Errors
    ///
    /// - [`AttachmentError::Queue`] if `job` belongs to another column
    /// - [`AttachmentError::CacheAssignment`] naming every missing field,
    ///   including when the record carries none of them
    /// - [`AttachmentError::InvalidCacheName`] and storage failures propagate
    #[instrument(skip_all, fields(column = %self.column, cache_name = %job.cache_name))]
    pub async fn commit_deferred<R: HostRecord + ?Sized>(
        &self,
        job: &DeferredCommit,
        record: &mut R,
    ) -> Result<Option<StoredFile>, AttachmentError> {
        if job.column != self.column {
            return Err(AttachmentError::queue(format!(
                "job for `{}` routed to mount `{}`",
                job.column, self.column
            )));
        }
        if record.read_identifier(&self.column).as_deref() == Some(job.cache_name.as_str()) {
            debug!(record = %job.record_ref, "deferred commit already applied");
            return Ok(None);
        }

        let (id, handle) =
            DeferredCommitBridge::new(&self.cache).reconstruct(&*record, &self.column)?;
        if id.to_string() != job.cache_name {
            debug!(record_cache_name = %id, "record carries a newer cache entry");
        }

        let mut slot = self.slot(&*record);
        slot.restore_pending(id, handle);
        slot.store(None, record).await
    }
}
