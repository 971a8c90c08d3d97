//! Key-value persistence tier

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;

/// The key-value store backing compiled-configuration persistence.
///
/// The single-flight discipline in the registry holds in process
/// regardless of whether the store is distributed; implementations only
/// provide get/set with a TTL.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>>;
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Store failures; surfaced as cache-unavailable to registration callers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(detail) => {
                write!(f, "Store unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl<T: ConfigStore + ?Sized> ConfigStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        (**self).set(key, value, ttl)
    }
}

/// In-memory store with TTL expiry, for embedding and tests
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        let key = key.to_string();
        async move {
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            match entries.get(&key) {
                Some((_, Some(expires))) if *expires <= Instant::now() => {
                    entries.remove(&key);
                    Ok(None)
                }
                Some((value, _)) => Ok(Some(value.clone())),
                None => Ok(None),
            }
        }
        .boxed()
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        async move {
            let expires = if ttl.is_zero() {
                // A zero TTL expires immediately
                Some(Instant::now())
            } else {
                Instant::now().checked_add(ttl)
            };
            let mut entries = self
                .entries
                .lock()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            entries.insert(key, (value, expires));
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();
        store.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
