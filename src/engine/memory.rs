//! Memory Engine Module
//!
//! In-process storage engine combining HashMap storage with LRU tracking and
//! TTL expiration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::{CacheItem, EngineStats, LruTracker, StorageEngine};
use crate::key::Key;
use crate::tasks::spawn_cleanup_task;

// == Memory Config ==
/// Limits and housekeeping settings for [`MemoryEngine`].
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum number of entries held at once
    pub max_entries: usize,
    /// Maximum total estimated size of all entries in bytes
    pub max_byte_size: usize,
    /// Interval between expired-entry sweeps; zero disables the sweeper
    pub cleanup_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_byte_size: 100 * 1024 * 1024,
            cleanup_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
struct StoredEntry {
    item: CacheItem,
    size: usize,
}

// == Memory Store ==
/// The entry table behind [`MemoryEngine`].
#[derive(Debug)]
pub struct MemoryStore {
    entries: HashMap<Key, StoredEntry>,
    lru: LruTracker,
    stats: EngineStats,
    byte_size: usize,
    max_entries: usize,
    max_byte_size: usize,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new(max_entries: usize, max_byte_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: EngineStats::new(),
            byte_size: 0,
            max_entries,
            max_byte_size,
        }
    }

    // == Set ==
    /// Stores an item, replacing any previous item under the same key.
    ///
    /// Least recently used entries are evicted until the new item fits
    /// within both the entry and byte limits.
    pub fn set(&mut self, key: Key, item: CacheItem) -> anyhow::Result<()> {
        let size = estimate_size(&key, &item.item)?;
        if size > self.max_byte_size {
            bail!(
                "Item of {} bytes exceeds the cache limit of {} bytes",
                size,
                self.max_byte_size
            );
        }

        self.remove_entry(&key);

        while self.entries.len() >= self.max_entries
            || self.byte_size + size > self.max_byte_size
        {
            match self.lru.evict_oldest() {
                Some(victim) => {
                    if let Some(evicted) = self.entries.remove(&victim) {
                        self.byte_size -= evicted.size;
                    }
                    self.stats.record_eviction();
                    debug!("Evicted {} to make room for {}", victim, key);
                }
                None => bail!("Cache size limit reached"),
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, StoredEntry { item, size });
        self.byte_size += size;
        self.update_footprint();

        Ok(())
    }

    // == Get ==
    /// Returns the item for a key if present and not expired.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &Key) -> Option<CacheItem> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.item.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.update_footprint();
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.item.clone())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&mut self, key: &Key) -> bool {
        let removed = self.remove_entry(key);
        self.update_footprint();
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<Key> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.item.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.update_footprint();
        expired_keys.len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.byte_size = 0;
        self.update_footprint();
    }

    // == Stats ==
    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current estimated size of all entries in bytes.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    fn remove_entry(&mut self, key: &Key) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.byte_size -= entry.size;
                self.lru.remove(key);
                true
            }
            None => false,
        }
    }

    fn update_footprint(&mut self) {
        self.stats.set_footprint(self.entries.len(), self.byte_size);
    }
}

/// Estimates the footprint of an entry from its key and serialized value.
fn estimate_size(key: &Key, value: &Value) -> anyhow::Result<usize> {
    let payload = serde_json::to_vec(value)?;
    Ok(key.id.len() + key.segment.len() + payload.len())
}

// == Memory Engine ==
/// Storage engine keeping everything in process memory.
///
/// All entries are discarded on `stop`. While started, a background task
/// sweeps expired entries at the configured interval.
#[derive(Debug)]
pub struct MemoryEngine {
    config: MemoryConfig,
    store: Arc<RwLock<MemoryStore>>,
    ready: AtomicBool,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryEngine {
    pub fn new(config: MemoryConfig) -> Self {
        let store = MemoryStore::new(config.max_entries, config.max_byte_size);
        Self {
            config,
            store: Arc::new(RwLock::new(store)),
            ready: AtomicBool::new(false),
            sweeper: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    fn ensure_started(&self) -> anyhow::Result<()> {
        if !self.ready.load(Ordering::SeqCst) {
            bail!("Connection not started");
        }
        Ok(())
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn start(&self) -> anyhow::Result<()> {
        if self.ready.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if !self.config.cleanup_interval.is_zero() {
            let handle = spawn_cleanup_task(self.store.clone(), self.config.cleanup_interval);
            *self.sweeper.lock() = Some(handle);
        }

        info!(
            "Memory engine started: max_entries={}, max_byte_size={}",
            self.config.max_entries, self.config.max_byte_size
        );
        Ok(())
    }

    fn stop(&self) {
        if !self.ready.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
        self.store.write().clear();
        info!("Memory engine stopped");
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &Key) -> anyhow::Result<Option<CacheItem>> {
        self.ensure_started()?;
        Ok(self.store.write().get(key))
    }

    async fn set(&self, key: &Key, value: Value, ttl: Duration) -> anyhow::Result<()> {
        self.ensure_started()?;
        let item = CacheItem::new(value, ttl);
        self.store.write().set(key.clone(), item)
    }

    async fn remove(&self, key: &Key) -> anyhow::Result<()> {
        self.ensure_started()?;
        self.store.write().delete(key);
        Ok(())
    }

    fn stats(&self) -> Option<EngineStats> {
        Some(self.store.read().stats())
    }
}

impl Drop for MemoryEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
