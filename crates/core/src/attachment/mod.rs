//! Attachment lifecycle for files mounted on host records.
//!
//! This module provides:
//! - The per-record slot state machine (cache, store, retrieve, remove)
//! - Deferred commit reconstruction from persisted record fields
//! - The integrity/processing validation gate
//! - Mount points wiring slots into a host's save and destroy path

mod deferred;
mod error;
mod hooks;
mod mount;
mod record;
mod slot;
mod types;
mod validation;


pub use deferred::DeferredCommitBridge;
pub use error::{AttachmentError, CacheAssignmentError};
pub use hooks::{AttachmentHooks, HookFlow, NoHooks};
pub use mount::{CommitQueue, Mount, SaveOutcome};
pub use record::HostRecord;
pub use slot::AttachmentSlot;
pub use types::{CacheFields, DeferredCommit, ErrorFlags, MountOptions, SlotState};
pub use validation::{ValidationGate, ValidationResult, check};
