//! Key Module
//!
//! Cache keys and the validation rules applied before anything reaches an engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Key ==
/// Addresses a single item: an id inside a named segment.
///
/// `Key::default()` is the empty key, which never passes validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Item identifier within the segment
    pub id: String,
    /// Segment (namespace) the item belongs to
    pub segment: String,
}

impl Key {
    /// Creates a new key.
    pub fn new(id: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            segment: segment.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.segment, self.id)
    }
}

// == Validate Key ==
/// Checks that a key is present and well formed.
///
/// # Errors
/// - `InvalidKey` when the key is absent or its id or segment is empty
/// - `InvalidSegment` when the segment contains a reserved character
pub fn validate_key(key: Option<&Key>) -> Result<()> {
    let key = key.ok_or_else(|| CacheError::InvalidKey("key is absent".to_string()))?;

    if key.id.is_empty() {
        return Err(CacheError::InvalidKey("id must be a non-empty string".to_string()));
    }

    if key.segment.is_empty() {
        return Err(CacheError::InvalidKey(
            "segment must be a non-empty string".to_string(),
        ));
    }

    validate_segment_name(&key.segment)
}

// == Validate Segment Name ==
/// Checks a segment name against the rules every engine shares.
///
/// Empty names are rejected, as are names containing NUL or any other ASCII
/// control character.
pub fn validate_segment_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CacheError::InvalidSegment("empty string".to_string()));
    }

    if name.contains('\0') {
        return Err(CacheError::InvalidSegment(
            "includes null character".to_string(),
        ));
    }

    if let Some(c) = name.chars().find(|c| c.is_ascii_control()) {
        return Err(CacheError::InvalidSegment(format!(
            "includes control character {:?}",
            c
        )));
    }

    Ok(())
}
