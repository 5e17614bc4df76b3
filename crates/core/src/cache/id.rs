//! Cache identifiers.
//!
//! A cache identifier is the pair `(cache_dir, filename)` rendered on disk
//! and in host records as `"<cache_dir>/<filename>"`. The split happens on
//! the first `/` only.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::attachment::AttachmentError;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Two-part token locating an uncommitted file in the cache medium.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheId {
    dir: String,
    filename: String,
}

impl CacheId {
    /// Generate a fresh identifier for `original_filename`.
    ///
    /// The directory token is `<unix-seconds>-<pid>-<counter>`; the counter is
    /// process-wide and monotonic, so back-to-back calls never collide even
    /// within the same second.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidUpload`] if the filename sanitizes
    /// to nothing usable.
    pub fn generate(original_filename: &str) -> Result<Self, AttachmentError> {
        let filename = sanitize_filename(original_filename);
        if filename.is_empty() || filename == "." || filename == ".." {
            return Err(AttachmentError::InvalidUpload(format!(
                "unusable filename: {original_filename:?}"
            )));
        }

        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = format!(
            "{}-{}-{counter:04}",
            Utc::now().timestamp(),
            std::process::id()
        );

        Ok(Self { dir, filename })
    }

    /// Parse `"<cache_dir>/<filename>"`, splitting on the first `/`.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidCacheName`] when either segment is
    /// empty, the directory token has characters outside `[0-9A-Za-z_-]`, or
    /// the filename would escape its directory.
    pub fn parse(cache_name: &str) -> Result<Self, AttachmentError> {
        let invalid = || AttachmentError::InvalidCacheName(cache_name.to_string());

        let (dir, filename) = cache_name.split_once('/').ok_or_else(invalid)?;

        let dir_ok = !dir.is_empty()
            && dir
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let filename_ok = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);

        if !dir_ok || !filename_ok {
            return Err(invalid());
        }

        Ok(Self {
            dir: dir.to_string(),
            filename: filename.to_string(),
        })
    }

    /// The unique directory token.
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// The sanitized filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Creation time encoded in a generated directory token.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        token_timestamp(&self.dir)
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir, self.filename)
    }
}

/// Timestamp prefix of a generated directory token.
pub(crate) fn token_timestamp(dir: &str) -> Option<DateTime<Utc>> {
    let mut parts = dir.splitn(3, '-');
    let secs = parts.next()?.parse::<i64>().ok()?;
    // A generated token always has pid and counter parts.
    parts.next()?.parse::<u32>().ok()?;
    parts.next()?.parse::<u64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Sanitize an uploaded filename for use in the cache medium.
///
/// Directory components are dropped. Only ASCII alphanumeric characters,
/// dots, hyphens, and underscores survive; everything else becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    // Back-to-back generation never repeats an identifier.
    proptest! {
        #[test]
        fn prop_generated_ids_are_unique(
            filename in "[a-zA-Z0-9_-]{1,20}\\.[a-z]{2,4}",
            count in 2usize..200,
        ) {
            let mut seen = HashSet::new();
            for _ in 0..count {
                let id = CacheId::generate(&filename).expect("valid filename");
                prop_assert!(seen.insert(id));
            }
        }
    }

    // Whatever we generate parses back to the same pair.
    proptest! {
        #[test]
        fn prop_generated_ids_parse_back(filename in ".{1,40}") {
            if let Ok(id) = CacheId::generate(&filename) {
                let parsed = CacheId::parse(&id.to_string()).expect("parsable");
                prop_assert_eq!(parsed, id);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);

            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }
    }
}
