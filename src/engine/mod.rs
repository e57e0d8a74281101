//! Engine Module
//!
//! The storage engine contract consumed by [`Client`](crate::Client), plus the
//! bundled in-memory engine.

mod entry;
mod lru;
mod memory;
mod stats;


use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::key::Key;

// Re-export public types
pub use entry::{current_timestamp_ms, duration_ms, CacheItem};
pub use lru::LruTracker;
pub use memory::{MemoryConfig, MemoryEngine, MemoryStore};
pub use stats::EngineStats;

// == Storage Engine ==
/// A pluggable storage backend.
///
/// Engines report their own failures as opaque `anyhow::Error`s; the client
/// forwards them without interpretation. Keys handed to an engine have
/// already been validated.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Connects to the backing store.
    async fn start(&self) -> anyhow::Result<()>;

    /// Disconnects from the backing store.
    fn stop(&self);

    /// Returns whether the connection is usable for I/O.
    fn is_ready(&self) -> bool;

    /// Fetches the stored envelope for a key, if any.
    ///
    /// An engine may return an envelope that has already expired; the client
    /// treats it as absent.
    async fn get(&self, key: &Key) -> anyhow::Result<Option<CacheItem>>;

    /// Stores a value for the given ttl.
    async fn set(&self, key: &Key, value: Value, ttl: Duration) -> anyhow::Result<()>;

    /// Removes a key. Removing a missing key is not an error.
    async fn remove(&self, key: &Key) -> anyhow::Result<()>;

    /// Applies engine-specific segment naming rules on top of the shared ones.
    fn validate_segment_name(&self, _name: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns usage statistics when the engine tracks them.
    fn stats(&self) -> Option<EngineStats> {
        None
    }
}
