//! Cache Item Module
//!
//! The envelope engines return for a stored value, carrying what is needed
//! to decide expiry.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

// == Cache Item ==
/// A stored value with its storage time and ttl.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheItem {
    /// The stored value
    pub item: Value,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Time to live from `stored_at`
    pub ttl: Duration,
}

impl CacheItem {
    // == Constructor ==
    /// Creates an envelope stored now.
    pub fn new(item: Value, ttl: Duration) -> Self {
        Self {
            item,
            stored_at: current_timestamp_ms(),
            ttl,
        }
    }

    // == Expires At ==
    /// Expiration timestamp (Unix milliseconds).
    ///
    /// Saturates at `u64::MAX`, so very large ttls never wrap into the past.
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(duration_ms(self.ttl))
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// An item is expired once the current time is greater than or equal to
    /// its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against a given timestamp (Unix milliseconds).
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at()
    }

    // == Time To Live ==
    /// Returns the remaining time to live, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        let now = current_timestamp_ms();
        Duration::from_millis(self.expires_at().saturating_sub(now))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Converts a duration to whole milliseconds, rounding sub-millisecond
/// remainders up and saturating at `u64::MAX`.
pub fn duration_ms(ttl: Duration) -> u64 {
    let mut ms = ttl.as_millis();
    if ttl.subsec_nanos() % 1_000_000 != 0 {
        ms += 1;
    }
    u64::try_from(ms).unwrap_or(u64::MAX)
}
