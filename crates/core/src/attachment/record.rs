//! Host record contract.

use super::types::CacheFields;

/// The record an attachment is mounted on.
///
/// Every accessor takes the mount column, so one record type can carry
/// several mounts and name its fields after each of them. Implementors map
/// these calls onto their own persistence layer; nothing here is persisted
/// by the core itself.
pub trait HostRecord: Send + Sync {
    /// Opaque reference a deferred-commit worker uses to reload this record.
    fn record_ref(&self) -> String;

    /// Persisted storage identifier for `column`.
    fn read_identifier(&self, column: &str) -> Option<String>;

    /// Set or clear the persisted storage identifier for `column`.
    fn write_identifier(&mut self, column: &str, identifier: Option<&str>);

    /// Whether commits for this record run out of process.
    ///
    /// This is a property of the record type, fixed when it is configured.
    fn is_deferred_commit(&self) -> bool {
        false
    }

    /// Persisted `"<cache_dir>/<filename>"` for `column`.
    fn read_cache_name(&self, _column: &str) -> Option<String> {
        None
    }

    /// Persisted content type of the cached upload for `column`.
    fn read_content_type(&self, _column: &str) -> Option<String> {
        None
    }

    /// Persisted original filename of the cached upload for `column`.
    fn read_original_filename(&self, _column: &str) -> Option<String> {
        None
    }

    /// Set or clear all three cache reconstruction fields for `column`.
    fn write_cache_fields(&mut self, _column: &str, _fields: Option<&CacheFields>) {}

    /// Integrity error flag for `column`.
    fn read_integrity_error(&self, _column: &str) -> bool {
        false
    }

    /// Processing error flag for `column`.
    fn read_processing_error(&self, _column: &str) -> bool {
        false
    }
}
