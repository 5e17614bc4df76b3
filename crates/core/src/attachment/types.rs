//! Attachment types and data structures.

use serde::{Deserialize, Serialize};

use super::record::HostRecord;

/// Lifecycle state of an attachment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing cached, nothing stored.
    Empty,
    /// A cached file awaits commit.
    Cached,
    /// A committed file is referenced by the record.
    Stored,
}

impl SlotState {
    /// Convert to string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Cached => "cached",
            Self::Stored => "stored",
        }
    }
}

/// Integrity and processing flags set by external processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorFlags {
    /// Upload failed type validation.
    pub integrity_error: bool,
    /// A processing step failed.
    pub processing_error: bool,
}

impl ErrorFlags {
    /// Read the flags for `column` from a host record.
    #[must_use]
    pub fn from_record<R: HostRecord + ?Sized>(record: &R, column: &str) -> Self {
        Self {
            integrity_error: record.read_integrity_error(column),
            processing_error: record.read_processing_error(column),
        }
    }
}

/// The three record fields a deferred commit is rebuilt from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFields {
    /// `"<cache_dir>/<filename>"`.
    pub cache_name: String,
    /// Content type of the cached upload.
    pub content_type: String,
    /// Original filename of the cached upload.
    pub original_filename: String,
}

/// Per-mount configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MountOptions {
    /// Report integrity errors from [`validate`](super::Mount::validate).
    #[serde(default = "default_true")]
    pub validate_integrity: bool,
    /// Report processing errors from [`validate`](super::Mount::validate).
    #[serde(default = "default_true")]
    pub validate_processing: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            validate_integrity: true,
            validate_processing: true,
        }
    }
}

/// Job handed to a queue when a commit is deferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredCommit {
    /// Opaque reference the worker uses to reload the record.
    pub record_ref: String,
    /// Mount column to commit.
    pub column: String,
    /// Cache name written onto the record before save.
    pub cache_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_options_defaults() {
        let options: MountOptions = serde_json::from_str("{}").expect("valid");
        assert_eq!(options, MountOptions::default());

        let options: MountOptions =
            serde_json::from_str(r#"{"validate_processing":false}"#).expect("valid");
        assert!(options.validate_integrity);
        assert!(!options.validate_processing);
    }

    #[test]
    fn test_deferred_commit_json_shape() {
        let job = DeferredCommit {
            record_ref: "user:7".to_string(),
            column: "avatar".to_string(),
            cache_name: "ab12/avatar.png".to_string(),
        };
        let json = serde_json::to_value(&job).expect("serializable");
        assert_eq!(json["cache_name"], "ab12/avatar.png");

        let back: DeferredCommit = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, job);
    }

    #[test]
    fn test_slot_state_as_str() {
        assert_eq!(SlotState::Empty.as_str(), "empty");
        assert_eq!(SlotState::Cached.as_str(), "cached");
        assert_eq!(SlotState::Stored.as_str(), "stored");
    }
}
