//! Client Module
//!
//! Wraps a single storage engine behind one lifecycle and one validation
//! contract, whatever engine is plugged in.
//!
//! # Lifecycle
//! ```text
//! Stopped --start--> Starting --connect ok--> Ready
//!                    Starting --connect err-> Stopped
//! Ready --start--> Ready
//! Ready --stop---> Stopped
//! ```
//! Concurrent `start` calls share one engine connect. A `stop` issued while
//! a connect is in flight is recorded; once the connect settles the engine is
//! disconnected and every waiting caller receives `NotConnected`, unless a
//! later `start` joined the connect after the stop.

use std::fmt;
use std::mem;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::engine::StorageEngine;
use crate::error::{CacheError, Result};
use crate::key::{self, Key};

// == Cached ==
/// A live item returned by [`Client::get`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached {
    /// The stored value
    pub item: Value,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Remaining time to live
    pub ttl: Duration,
}

type Waiter = oneshot::Sender<Result<()>>;

enum Lifecycle {
    Stopped,
    Starting {
        waiters: Vec<Waiter>,
        stop_requested: bool,
    },
    Ready,
}

// == Client ==
/// Owns one storage engine and mediates every call made to it.
pub struct Client {
    engine: Box<dyn StorageEngine>,
    state: Mutex<Lifecycle>,
}

impl Client {
    /// Creates a stopped client owning `engine`.
    pub fn new(engine: impl StorageEngine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    /// Creates a stopped client owning an already boxed engine.
    pub fn from_boxed(engine: Box<dyn StorageEngine>) -> Self {
        Self {
            engine,
            state: Mutex::new(Lifecycle::Stopped),
        }
    }

    // == Start ==
    /// Connects the engine.
    ///
    /// Returns at once when already ready. When a connect is already in
    /// flight the caller waits for it and receives its outcome; the engine is
    /// only ever asked to connect once per start cycle. A client whose engine
    /// has lost its connection connects again.
    ///
    /// Joining an in-flight connect cancels a `stop` issued during it.
    pub async fn start(&self) -> Result<()> {
        let pending = {
            let mut state = self.state.lock();
            match &mut *state {
                Lifecycle::Ready if self.engine.is_ready() => return Ok(()),
                Lifecycle::Starting {
                    waiters,
                    stop_requested,
                } => {
                    // a newer start overrides an earlier stop
                    *stop_requested = false;
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                Lifecycle::Ready => {
                    warn!("Engine connection lost, reconnecting");
                    *state = Lifecycle::Starting {
                        waiters: Vec::new(),
                        stop_requested: false,
                    };
                    None
                }
                Lifecycle::Stopped => {
                    *state = Lifecycle::Starting {
                        waiters: Vec::new(),
                        stop_requested: false,
                    };
                    None
                }
            }
        };

        if let Some(rx) = pending {
            debug!("Start already in flight, waiting for it to settle");
            // A dropped sender means the leading start was abandoned
            return rx.await.unwrap_or(Err(CacheError::NotConnected));
        }

        let mut guard = StartGuard {
            client: self,
            settled: false,
        };
        let outcome = self.engine.start().await.map_err(CacheError::from);
        guard.settled = true;
        self.settle(outcome)
    }

    /// Resolves an in-flight start and notifies every waiter.
    fn settle(&self, outcome: Result<()>) -> Result<()> {
        let (waiters, result) = {
            let mut state = self.state.lock();
            let (waiters, stop_requested) = match mem::replace(&mut *state, Lifecycle::Stopped) {
                Lifecycle::Starting {
                    waiters,
                    stop_requested,
                } => (waiters, stop_requested),
                _ => (Vec::new(), false),
            };

            let result = match outcome {
                Ok(()) if stop_requested => {
                    self.engine.stop();
                    info!("Client stopped while starting, engine disconnected");
                    Err(CacheError::NotConnected)
                }
                Ok(()) => {
                    *state = Lifecycle::Ready;
                    info!("Client started");
                    Ok(())
                }
                Err(err) => {
                    warn!("Client failed to start: {}", err);
                    Err(err)
                }
            };

            (waiters, result)
        };

        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }

        result
    }

    // == Stop ==
    /// Disconnects the engine. Takes effect immediately and is idempotent.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match &mut *state {
            Lifecycle::Ready => {
                self.engine.stop();
                *state = Lifecycle::Stopped;
                info!("Client stopped");
            }
            Lifecycle::Starting { stop_requested, .. } => {
                *stop_requested = true;
                debug!("Stop requested while starting");
            }
            Lifecycle::Stopped => {}
        }
    }

    // == Is Ready ==
    /// Returns whether the client is started and its engine is usable.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), Lifecycle::Ready) && self.engine.is_ready()
    }

    // == Validate Segment Name ==
    /// Applies the shared segment rules, then the engine's own.
    pub fn validate_segment_name(&self, name: &str) -> Result<()> {
        key::validate_segment_name(name)?;
        self.engine
            .validate_segment_name(name)
            .map_err(|err| CacheError::InvalidSegment(err.to_string()))
    }

    // == Get ==
    /// Looks up a key.
    ///
    /// An absent key is a lookup for nothing and yields `Ok(None)` without
    /// reaching the engine. Missing and expired items also yield `Ok(None)`.
    pub async fn get(&self, key: Option<&Key>) -> Result<Option<Cached>> {
        self.ensure_ready()?;

        let Some(key) = key else {
            return Ok(None);
        };
        self.validate(key)?;

        let envelope = match self.engine.get(key).await? {
            Some(envelope) => envelope,
            None => return Ok(None),
        };

        if envelope.is_expired() {
            debug!("Discarding expired item {}", key);
            return Ok(None);
        }

        Ok(Some(Cached {
            ttl: envelope.ttl_remaining(),
            stored_at: envelope.stored_at,
            item: envelope.item,
        }))
    }

    // == Set ==
    /// Stores a value for `ttl`.
    ///
    /// A zero ttl means "do not cache": the call succeeds without reaching
    /// the engine.
    pub async fn set(&self, key: Option<&Key>, value: Value, ttl: Duration) -> Result<()> {
        self.ensure_ready()?;

        let key = key.ok_or_else(|| CacheError::InvalidKey("key is absent".to_string()))?;
        self.validate(key)?;

        if ttl.is_zero() {
            debug!("Skipping set of {} with zero ttl", key);
            return Ok(());
        }

        self.engine.set(key, value, ttl).await?;
        Ok(())
    }

    // == Remove ==
    /// Removes a key. Unlike [`get`](Self::get), an absent key is an error.
    pub async fn remove(&self, key: Option<&Key>) -> Result<()> {
        self.ensure_ready()?;

        let key = key.ok_or_else(|| CacheError::InvalidKey("key is absent".to_string()))?;
        self.validate(key)?;

        self.engine.remove(key).await?;
        Ok(())
    }

    /// Returns the engine's statistics, if it keeps any.
    pub fn stats(&self) -> Option<crate::engine::EngineStats> {
        self.engine.stats()
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CacheError::NotConnected)
        }
    }

    fn validate(&self, key: &Key) -> Result<()> {
        key::validate_key(Some(key))?;
        self.engine
            .validate_segment_name(&key.segment)
            .map_err(|err| CacheError::InvalidSegment(err.to_string()))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            Lifecycle::Stopped => "stopped",
            Lifecycle::Starting { .. } => "starting",
            Lifecycle::Ready => "ready",
        };
        f.debug_struct("Client").field("state", &state).finish()
    }
}

/// Puts an abandoned start back into `Stopped`.
///
/// If the leading `start` future is dropped before the engine connect
/// settles, queued callers are released with `NotConnected`.
struct StartGuard<'a> {
    client: &'a Client,
    settled: bool,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Start abandoned before the engine connected");
            self.client.engine.stop();
            let _ = self.client.settle(Err(CacheError::NotConnected));
        }
    }
}
