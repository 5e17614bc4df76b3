//! Integrity and processing validation gate.

use super::types::{ErrorFlags, MountOptions};

/// Outcome of consulting the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// No enabled check failed.
    Ok,
    /// The upload is not an allowed type of file.
    IntegrityFailed,
    /// A processing step failed.
    ProcessingFailed,
}

impl ValidationResult {
    /// Whether persistence may proceed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Default error message for the failed check.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::IntegrityFailed => Some("is not an allowed type of file."),
            Self::ProcessingFailed => Some("failed to be processed."),
        }
    }
}

/// Reports pass/fail from error flags without touching attachment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationGate {
    validate_integrity: bool,
    validate_processing: bool,
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ValidationGate {
    /// Create a gate with the given checks enabled.
    #[must_use]
    pub fn new(validate_integrity: bool, validate_processing: bool) -> Self {
        Self {
            validate_integrity,
            validate_processing,
        }
    }

    /// Create a gate from mount options.
    #[must_use]
    pub fn from_options(options: &MountOptions) -> Self {
        Self::new(options.validate_integrity, options.validate_processing)
    }

    /// Check the flags. Integrity is reported ahead of processing.
    #[must_use]
    pub fn check(&self, flags: ErrorFlags) -> ValidationResult {
        if self.validate_integrity && flags.integrity_error {
            ValidationResult::IntegrityFailed
        } else if self.validate_processing && flags.processing_error {
            ValidationResult::ProcessingFailed
        } else {
            ValidationResult::Ok
        }
    }
}

/// Check the flags with every check enabled.
#[must_use]
pub fn check(flags: ErrorFlags) -> ValidationResult {
    ValidationGate::default().check(flags)
}
