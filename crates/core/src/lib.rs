//! Attachment lifecycle core for Stowage.
//!
//! Uploads are cached under a unique identifier, optionally processed by the
//! host, validated, and finally committed to a pluggable storage backend,
//! either inline or later from a deferred-commit worker.
//!
//! # Modules
//!
//! - `cache` - Temporary cache medium and cache identifiers
//! - `storage` - Backend contract and the OpenDAL object store
//! - `attachment` - Slot state machine, validation, deferred commits, mounts
//! - `file` - Upload sources and file handles

pub mod attachment;
pub mod cache;
pub mod file;
pub mod storage;

pub use attachment::{
    AttachmentError, AttachmentSlot, HostRecord, Mount, MountOptions, ValidationResult,
};
pub use cache::{CacheId, CacheStore};
pub use file::{DEFAULT_CONTENT_TYPE, FileHandle, FileLocation, Upload};
pub use storage::{ObjectStorage, StorageBackend, StorageError, StoredFile};
