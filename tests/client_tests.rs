//! Client Contract Tests
//!
//! The same suite runs against every engine: the bundled memory engine and a
//! lazily-expiring test engine that counts connects.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use stashbox::{
    CacheError, CacheItem, Client, Key, MemoryEngine, Policy, PolicyConfig, StorageEngine,
};
use tokio_test::assert_ok;

// == Test Engine ==
/// Keeps items forever (expiry is left to the client) and takes a moment to
/// connect, so overlapping starts really overlap.
#[derive(Default)]
struct LazyEngine {
    items: Mutex<HashMap<Key, CacheItem>>,
    connected: Arc<AtomicBool>,
    connects: Arc<AtomicUsize>,
}

#[async_trait]
impl StorageEngine for LazyEngine {
    async fn start(&self) -> anyhow::Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.items.lock().clear();
    }

    fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &Key) -> anyhow::Result<Option<CacheItem>> {
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set(&self, key: &Key, value: Value, ttl: Duration) -> anyhow::Result<()> {
        self.items
            .lock()
            .insert(key.clone(), CacheItem::new(value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &Key) -> anyhow::Result<()> {
        self.items.lock().remove(key);
        Ok(())
    }
}

// == Shared Suite ==
macro_rules! engine_suite {
    ($name:ident, $engine:expr) => {
        mod $name {
            use super::*;
            use tokio_test::{assert_err, assert_ok};

            fn new_client() -> Client {
                Client::new($engine)
            }

            fn test_key() -> Key {
                Key::new("x", "test")
            }

            async fn started_client() -> Client {
                let client = new_client();
                assert_ok!(client.start().await);
                client
            }

            #[tokio::test]
            async fn creates_a_new_connection() {
                let client = started_client().await;
                assert!(client.is_ready());
            }

            #[tokio::test]
            async fn closes_the_connection() {
                let client = started_client().await;
                client.stop();
                assert!(!client.is_ready());
            }

            #[tokio::test]
            async fn gets_an_item_after_setting_it() {
                let client = started_client().await;
                let key = test_key();

                assert_ok!(
                    client
                        .set(Some(&key), Value::from("123"), Duration::from_millis(500))
                        .await
                );
                let cached = assert_ok!(client.get(Some(&key)).await);

                assert_eq!(cached.map(|c| c.item), Some(Value::from("123")));
            }

            #[tokio::test]
            async fn gets_an_item_after_setting_it_with_very_long_ttl() {
                let client = started_client().await;
                let key = test_key();

                assert_ok!(
                    client
                        .set(Some(&key), Value::from("123"), Duration::from_millis(1 << 63))
                        .await
                );
                let cached = assert_ok!(client.get(Some(&key)).await);

                assert_eq!(cached.map(|c| c.item), Some(Value::from("123")));
            }

            #[tokio::test]
            async fn ignores_starting_a_connection_twice_at_once() {
                let client = new_client();

                let (first, second) = tokio::join!(client.start(), client.start());

                assert_ok!(first);
                assert_ok!(second);
                assert!(client.is_ready());
            }

            #[tokio::test]
            async fn ignores_starting_a_connection_twice_chained() {
                let client = started_client().await;

                assert_ok!(client.start().await);
                assert!(client.is_ready());
            }

            #[tokio::test]
            async fn returns_not_found_on_get_with_absent_key() {
                let client = started_client().await;

                let cached = assert_ok!(client.get(None).await);
                assert!(cached.is_none());
            }

            #[tokio::test]
            async fn returns_not_found_on_get_when_item_expired() {
                let client = started_client().await;
                let key = test_key();

                assert_ok!(
                    client
                        .set(Some(&key), Value::from("x"), Duration::from_millis(1))
                        .await
                );
                tokio::time::sleep(Duration::from_millis(2)).await;

                let cached = assert_ok!(client.get(Some(&key)).await);
                assert!(cached.is_none());
            }

            #[tokio::test]
            async fn returns_error_on_set_with_absent_key() {
                let client = started_client().await;

                let err = assert_err!(
                    client
                        .set(None, Value::Null, Duration::from_millis(1000))
                        .await
                );
                assert!(matches!(err, CacheError::InvalidKey(_)));
            }

            #[tokio::test]
            async fn returns_error_on_get_with_invalid_key() {
                let client = started_client().await;

                let err = assert_err!(client.get(Some(&Key::default())).await);
                assert!(matches!(
                    err,
                    CacheError::InvalidKey(_) | CacheError::InvalidSegment(_)
                ));
            }

            #[tokio::test]
            async fn returns_error_on_remove_with_invalid_key() {
                let client = started_client().await;

                let err = assert_err!(client.remove(Some(&Key::default())).await);
                assert!(matches!(err, CacheError::InvalidKey(_)));
            }

            #[tokio::test]
            async fn returns_error_on_set_with_invalid_key() {
                let client = started_client().await;

                let err = assert_err!(
                    client
                        .set(Some(&Key::default()), Value::Null, Duration::from_millis(1000))
                        .await
                );
                assert!(matches!(err, CacheError::InvalidKey(_)));
            }

            #[tokio::test]
            async fn returns_error_on_reserved_segment_in_key() {
                let client = started_client().await;
                let key = Key::new("x", "a\0b");

                let err = assert_err!(client.get(Some(&key)).await);
                assert!(matches!(err, CacheError::InvalidSegment(_)));
            }

            #[tokio::test]
            async fn ignores_set_with_zero_ttl() {
                let client = started_client().await;
                let key = test_key();

                assert_ok!(client.set(Some(&key), Value::from("y"), Duration::ZERO).await);

                let cached = assert_ok!(client.get(Some(&key)).await);
                assert!(cached.is_none());
            }

            #[tokio::test]
            async fn returns_error_on_remove_with_absent_key() {
                let client = started_client().await;

                let err = assert_err!(client.remove(None).await);
                assert!(matches!(err, CacheError::InvalidKey(_)));
            }

            #[tokio::test]
            async fn returns_error_on_get_when_stopped() {
                let client = new_client();
                client.stop();

                let err = assert_err!(client.get(Some(&test_key())).await);
                assert!(matches!(err, CacheError::NotConnected));
            }

            #[tokio::test]
            async fn returns_error_on_set_when_stopped() {
                let client = new_client();
                client.stop();

                let err = assert_err!(
                    client
                        .set(Some(&test_key()), Value::from("y"), Duration::from_millis(1))
                        .await
                );
                assert!(matches!(err, CacheError::NotConnected));
            }

            #[tokio::test]
            async fn returns_error_on_remove_when_stopped() {
                let client = new_client();
                client.stop();

                let err = assert_err!(client.remove(Some(&test_key())).await);
                assert!(matches!(err, CacheError::NotConnected));
            }

            #[tokio::test]
            async fn returns_not_connected_right_after_stop() {
                let client = started_client().await;
                let key = test_key();
                assert_ok!(
                    client
                        .set(Some(&key), Value::from("z"), Duration::from_secs(10))
                        .await
                );

                client.stop();

                assert!(matches!(client.get(Some(&key)).await, Err(CacheError::NotConnected)));
                assert!(matches!(client.get(None).await, Err(CacheError::NotConnected)));
                assert!(matches!(
                    client.set(Some(&key), Value::Null, Duration::from_secs(1)).await,
                    Err(CacheError::NotConnected)
                ));
                assert!(matches!(client.remove(None).await, Err(CacheError::NotConnected)));
            }

            #[tokio::test]
            async fn restarts_after_stop_without_old_items() {
                let client = started_client().await;
                let key = test_key();
                assert_ok!(
                    client
                        .set(Some(&key), Value::from("old"), Duration::from_secs(10))
                        .await
                );

                client.stop();
                assert_ok!(client.start().await);

                let cached = assert_ok!(client.get(Some(&key)).await);
                assert!(cached.is_none());
            }

            #[test]
            fn returns_error_on_missing_segment_name() {
                let config = PolicyConfig::expires_in(Duration::from_millis(50_000));
                let client = Arc::new(new_client());

                let err = assert_err!(Policy::new(config, client, ""));
                assert!(matches!(err, CacheError::InvalidSegment(_)));
            }

            #[test]
            fn returns_error_on_bad_segment_name() {
                let config = PolicyConfig::expires_in(Duration::from_millis(50_000));
                let client = Arc::new(new_client());

                let err = assert_err!(Policy::new(config, client, "a\0b"));
                assert!(matches!(err, CacheError::InvalidSegment(_)));
            }

            #[tokio::test]
            async fn returns_error_when_policy_item_removed_while_stopped() {
                let config = PolicyConfig::expires_in(Duration::from_millis(50_000));
                let client = Arc::new(new_client());
                let policy = assert_ok!(Policy::new(config, client.clone(), "test"));

                client.stop();

                let err = assert_err!(policy.remove("a").await);
                assert!(matches!(err, CacheError::NotConnected));
            }
        }
    };
}

engine_suite!(memory, MemoryEngine::default());
engine_suite!(lazy, LazyEngine::default());

// == Coalescing ==

#[tokio::test]
async fn concurrent_starts_trigger_exactly_one_connect() {
    let engine = LazyEngine::default();
    let connects = engine.connects.clone();
    let client = Arc::new(Client::new(engine));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.start().await })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert!(client.is_ready());
}

#[tokio::test]
async fn start_after_ready_does_not_reconnect() {
    let engine = LazyEngine::default();
    let connects = engine.connects.clone();
    let client = Client::new(engine);

    assert_ok!(client.start().await);
    assert_ok!(client.start().await);
    assert_ok!(client.start().await);

    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn each_start_cycle_connects_once() {
    let engine = LazyEngine::default();
    let connects = engine.connects.clone();
    let client = Client::new(engine);

    assert_ok!(client.start().await);
    client.stop();
    let (first, second) = tokio::join!(client.start(), client.start());
    assert_ok!(first);
    assert_ok!(second);

    assert_eq!(connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn start_reconnects_after_engine_loses_connection() {
    let engine = LazyEngine::default();
    let connects = engine.connects.clone();
    let connected = engine.connected.clone();
    let client = Client::new(engine);
    let key = Key::new("x", "test");

    assert_ok!(client.start().await);
    connected.store(false, Ordering::SeqCst);
    assert!(!client.is_ready());
    assert!(matches!(
        client.get(Some(&key)).await,
        Err(CacheError::NotConnected)
    ));

    assert_ok!(client.start().await);
    assert!(client.is_ready());
    assert_eq!(connects.load(Ordering::SeqCst), 2);
    assert_ok!(client.get(Some(&key)).await);

    // already connected again, so no further connect
    assert_ok!(client.start().await);
    assert_eq!(connects.load(Ordering::SeqCst), 2);
}
