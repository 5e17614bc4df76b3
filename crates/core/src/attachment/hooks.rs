//! Lifecycle hooks around cache, store and retrieve.

use crate::file::{FileHandle, Upload};
use crate::storage::StoredFile;

/// Whether a `before_*` hook lets the operation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookFlow {
    /// Run the operation.
    #[default]
    Continue,
    /// Skip the operation; the slot is left unchanged.
    Skip,
}

/// Host integration points wrapped around slot operations.
///
/// All methods default to doing nothing. Processing pipelines hook in here.
pub trait AttachmentHooks: Send + Sync {
    /// Runs before an upload is cached.
    fn before_cache(&self, _upload: &Upload) -> HookFlow {
        HookFlow::Continue
    }

    /// Runs after an upload is cached.
    fn after_cache(&self, _file: &FileHandle) {}

    /// Runs before a cached file is committed.
    fn before_store(&self, _file: &FileHandle) -> HookFlow {
        HookFlow::Continue
    }

    /// Runs after a commit succeeded.
    fn after_store(&self, _stored: &StoredFile) {}

    /// Runs before a stored file is retrieved.
    fn before_retrieve(&self, _identifier: &str) -> HookFlow {
        HookFlow::Continue
    }

    /// Runs after a stored file is retrieved.
    fn after_retrieve(&self, _file: &FileHandle) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl AttachmentHooks for NoHooks {}
