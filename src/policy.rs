//! Policy Module
//!
//! Binds a shared client to one segment and one expiration rule, so callers
//! address items by id alone.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Cached, Client};
use crate::engine::current_timestamp_ms;
use crate::error::{CacheError, Result};
use crate::key::Key;

// == Policy Config ==
/// Expiration rule for a policy.
///
/// At most one of `expires_in` and `expires_at` may be set. With neither,
/// items are not cached unless a ttl is given per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Relative lifetime measured from when an item is stored
    #[serde(default)]
    pub expires_in: Option<Duration>,
    /// Time of day (UTC) at which every item expires
    #[serde(default)]
    pub expires_at: Option<NaiveTime>,
}

impl PolicyConfig {
    pub fn expires_in(ttl: Duration) -> Self {
        Self {
            expires_in: Some(ttl),
            expires_at: None,
        }
    }

    pub fn expires_at(at: NaiveTime) -> Self {
        Self {
            expires_in: None,
            expires_at: Some(at),
        }
    }

    // == Validate ==
    /// Rejects rules that combine both modes or set a zero lifetime.
    pub fn validate(&self) -> Result<()> {
        if self.expires_in.is_some() && self.expires_at.is_some() {
            return Err(CacheError::InvalidRule(
                "cannot have both expires_in and expires_at".to_string(),
            ));
        }

        if self.expires_in.is_some_and(|ttl| ttl.is_zero()) {
            return Err(CacheError::InvalidRule(
                "expires_in must be positive".to_string(),
            ));
        }

        Ok(())
    }

    // == TTL ==
    /// Remaining lifetime at `now` of an item created at `created`
    /// (both Unix milliseconds).
    pub fn ttl_at(&self, created: u64, now: u64) -> Duration {
        if let Some(expires_in) = self.expires_in {
            let age = Duration::from_millis(now.saturating_sub(created));
            return expires_in.saturating_sub(age);
        }

        if let Some(at) = self.expires_at {
            let Some(expiry) = next_expiry(created, at) else {
                return Duration::ZERO;
            };
            return Duration::from_millis(expiry.saturating_sub(now));
        }

        Duration::ZERO
    }
}

/// First occurrence of `at` strictly after `created`, in Unix milliseconds.
fn next_expiry(created: u64, at: NaiveTime) -> Option<u64> {
    let created = Utc.timestamp_millis_opt(i64::try_from(created).ok()?).single()?;
    let mut expiry = Utc.from_utc_datetime(&created.date_naive().and_time(at));
    if expiry <= created {
        expiry += chrono::Duration::days(1);
    }
    u64::try_from(expiry.timestamp_millis()).ok()
}

// == Policy ==
/// Segment-scoped façade over a [`Client`].
///
/// Holds no lifecycle of its own; starting and stopping is done on the
/// client, which may be shared by many policies.
#[derive(Debug, Clone)]
pub struct Policy {
    client: Arc<Client>,
    segment: String,
    config: PolicyConfig,
}

impl Policy {
    // == Constructor ==
    /// Binds `client` to `segment` under `config`.
    ///
    /// Fails immediately on an invalid segment name or rule; nothing is sent
    /// to the engine.
    pub fn new(config: PolicyConfig, client: Arc<Client>, segment: impl Into<String>) -> Result<Self> {
        let segment = segment.into();
        client.validate_segment_name(&segment)?;
        config.validate()?;

        Ok(Self {
            client,
            segment,
            config,
        })
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Rule lifetime of an item created at `created` (Unix milliseconds).
    pub fn ttl(&self, created: u64) -> Duration {
        self.config.ttl_at(created, current_timestamp_ms())
    }

    // == Get ==
    pub async fn get(&self, id: &str) -> Result<Option<Cached>> {
        let key = self.key(id);
        self.client.get(Some(&key)).await
    }

    // == Set ==
    /// Stores `value` under `id`, using `ttl` when given and the policy rule
    /// otherwise.
    pub async fn set(&self, id: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let key = self.key(id);
        let ttl = ttl.unwrap_or_else(|| self.ttl(current_timestamp_ms()));
        self.client.set(Some(&key), value, ttl).await
    }

    // == Remove ==
    pub async fn remove(&self, id: &str) -> Result<()> {
        let key = self.key(id);
        self.client.remove(Some(&key)).await
    }

    fn key(&self, id: &str) -> Key {
        Key::new(id, self.segment.as_str())
    }
}
