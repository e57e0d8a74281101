//! Stashbox - A uniform caching client over pluggable storage engines
//!
//! A [`Client`] owns one [`StorageEngine`] and enforces a single lifecycle,
//! key validation and TTL contract over it. A [`Policy`] binds a shared
//! client to a segment and an expiration rule.

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod models;
pub mod policy;
mod tasks;

pub use api::AppState;
pub use client::{Cached, Client};
pub use config::Config;
pub use engine::{CacheItem, EngineStats, MemoryConfig, MemoryEngine, StorageEngine};
pub use error::{ApiError, CacheError, EngineError, Result};
pub use key::{validate_key, validate_segment_name, Key};
pub use policy::{Policy, PolicyConfig};
