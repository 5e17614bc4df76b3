//! Attachment slot: the per-record lifecycle state machine.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::deferred::DeferredCommitBridge;
use super::error::AttachmentError;
use super::hooks::{AttachmentHooks, HookFlow, NoHooks};
use super::record::HostRecord;
use super::types::SlotState;
use crate::cache::{CacheId, CacheStore};
use crate::file::{FileHandle, Upload};
use crate::storage::{StorageBackend, StoredFile};

/// Live state of one mounted file field on one record instance.
///
/// Transitions: `Empty → Cached → Stored → Empty`. Mutating operations take
/// `&mut self`, so a commit and the clearing of the cache identifier can
/// never interleave with another `store` on the same slot. Share a slot
/// across tasks behind `tokio::sync::Mutex`.
pub struct AttachmentSlot<B> {
    column: String,
    cache: Arc<CacheStore>,
    storage: Arc<B>,
    hooks: Arc<dyn AttachmentHooks>,
    file: Option<FileHandle>,
    cache_id: Option<CacheId>,
    stored_identifier: Option<String>,
}

impl<B: StorageBackend> AttachmentSlot<B> {
    /// Create an empty slot for `column`.
    #[must_use]
    pub fn new(column: impl Into<String>, cache: Arc<CacheStore>, storage: Arc<B>) -> Self {
        Self {
            column: column.into(),
            cache,
            storage,
            hooks: Arc::new(NoHooks),
            file: None,
            cache_id: None,
            stored_identifier: None,
        }
    }

    /// Install lifecycle hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn AttachmentHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Start from an identifier already persisted on the record.
    #[must_use]
    pub fn with_stored_identifier(mut self, identifier: Option<String>) -> Self {
        self.stored_identifier = identifier.filter(|id| !id.is_empty());
        self
    }

    /// Mount column this slot belongs to.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Current file reference.
    #[must_use]
    pub fn file(&self) -> Option<&FileHandle> {
        self.file.as_ref()
    }

    /// Identifier of the pending cache entry.
    #[must_use]
    pub fn cache_id(&self) -> Option<&CacheId> {
        self.cache_id.as_ref()
    }

    /// Identifier of the committed file.
    #[must_use]
    pub fn stored_identifier(&self) -> Option<&str> {
        self.stored_identifier.as_deref()
    }

    /// Derived lifecycle state.
    #[must_use]
    pub fn state(&self) -> SlotState {
        if self.cache_id.is_some() {
            SlotState::Cached
        } else if self.stored_identifier.is_some() {
            SlotState::Stored
        } else {
            SlotState::Empty
        }
    }

    /// Cache `upload`, replacing any pending cache entry.
    ///
    /// The replaced entry stays on the cache medium until
    /// [`CacheStore::clean`] sweeps it.
    #[instrument(skip_all, fields(column = %self.column))]
    pub async fn cache(&mut self, upload: &Upload) -> Result<(), AttachmentError> {
        self.cache_upload(upload).await.map(|_| ())
    }

    /// Cache `upload`; `false` when a hook skipped it.
    async fn cache_upload(&mut self, upload: &Upload) -> Result<bool, AttachmentError> {
        if self.hooks.before_cache(upload) == HookFlow::Skip {
            debug!("cache skipped by hook");
            return Ok(false);
        }

        let (id, handle) = self.cache.cache(upload).await?;
        if let Some(previous) = self.cache_id.replace(id) {
            debug!(cache_id = %previous, "pending cache entry abandoned");
        }
        self.hooks.after_cache(&handle);
        self.file = Some(handle);
        Ok(true)
    }

    /// Load a reconstructed cache entry as the pending file.
    pub(crate) fn restore_pending(&mut self, id: CacheId, file: FileHandle) {
        self.file = Some(file);
        self.cache_id = Some(id);
    }

    /// Commit the pending cached file to storage.
    ///
    /// With an upload, it is cached first; if a hook skips that caching,
    /// nothing is committed. Without an upload, a deferred-commit
    /// record with nothing pending in memory gets its cached file rebuilt
    /// from its persisted fields. The commit itself only runs while both a
    /// cached file and a cache identifier are held; a successful commit
    /// clears the identifier, so repeating the call is a no-op.
    ///
    /// Returns the stored file, or `None` when nothing was committed.
    ///
    /// # Errors
    ///
    /// Cache, reconstruction and storage failures propagate. After a storage
    /// failure the slot stays `Cached` and the call can be retried.
    #[instrument(skip_all, fields(column = %self.column))]
    pub async fn store<R: HostRecord + ?Sized>(
        &mut self,
        upload: Option<&Upload>,
        record: &mut R,
    ) -> Result<Option<StoredFile>, AttachmentError> {
        if let Some(upload) = upload {
            if !self.cache_upload(upload).await? {
                return Ok(None);
            }
        } else if self.pending_file().is_none()
            && record.is_deferred_commit()
            && DeferredCommitBridge::has_pending(&*record, &self.column)
        {
            let (id, handle) =
                DeferredCommitBridge::new(&self.cache).reconstruct(&*record, &self.column)?;
            self.restore_pending(id, handle);
        }

        let stored = {
            let Some(file) = self.pending_file() else {
                debug!(state = self.state().as_str(), "nothing to store");
                return Ok(None);
            };
            if self.hooks.before_store(file) == HookFlow::Skip {
                debug!("store skipped by hook");
                return Ok(None);
            }
            self.storage.store(file).await?
        };

        self.cache_id = None;
        record.write_identifier(&self.column, Some(&stored.identifier));
        if record.is_deferred_commit() {
            record.write_cache_fields(&self.column, None);
        }
        self.stored_identifier = Some(stored.identifier.clone());
        self.file = Some(stored.clone().into());
        self.hooks.after_store(&stored);

        info!(
            identifier = %stored.identifier,
            backend = self.storage.name(),
            size = stored.size,
            "attachment stored"
        );
        Ok(Some(stored))
    }

    /// Load a committed file into the slot.
    ///
    /// Only the file reference changes; pending cache and stored identifier
    /// are left as they are.
    #[instrument(skip_all, fields(column = %self.column, %identifier))]
    pub async fn retrieve(&mut self, identifier: &str) -> Result<(), AttachmentError> {
        if self.hooks.before_retrieve(identifier) == HookFlow::Skip {
            debug!("retrieve skipped by hook");
            return Ok(());
        }

        let handle = self.storage.retrieve(identifier).await?;
        self.hooks.after_retrieve(&handle);
        self.file = Some(handle);
        Ok(())
    }

    /// Delete the committed file from storage and clear it on `record`.
    ///
    /// Returns `false` without touching the backend when nothing is stored.
    ///
    /// # Errors
    ///
    /// Storage failures propagate; the slot and the record keep the
    /// identifier so the call can be retried.
    #[instrument(skip_all, fields(column = %self.column))]
    pub async fn remove<R: HostRecord + ?Sized>(
        &mut self,
        record: &mut R,
    ) -> Result<bool, AttachmentError> {
        let Some(identifier) = self.stored_identifier.as_deref() else {
            return Ok(false);
        };

        self.storage.remove(identifier).await?;
        info!(%identifier, backend = self.storage.name(), "attachment removed");

        if self.file.as_ref().and_then(FileHandle::identifier) == Some(identifier) {
            self.file = None;
        }
        self.stored_identifier = None;
        record.write_identifier(&self.column, None);
        Ok(true)
    }

    /// The cached file awaiting commit, if the guard conditions hold.
    fn pending_file(&self) -> Option<&FileHandle> {
        match (&self.file, &self.cache_id) {
            (Some(file), Some(_)) if file.is_cached() => Some(file),
            _ => None,
        }
    }
}
