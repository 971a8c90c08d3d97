//! Registration, resolution and single-flight compilation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{watch, Mutex, RwLock};

use crate::mapconfig::MapConfig;

use super::error::RegistryError;
use super::store::ConfigStore;
use super::token::{store_key, Token};

/// TTL handed to the backing store for compiled entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A compiled, validated configuration owned by the registry.
///
/// Immutable after construction; shared across concurrent requests via
/// `Arc`. The access counter is a fire-and-forget usage signal for
/// external telemetry and never affects resolution.
#[derive(Debug)]
pub struct CompiledConfig {
    pub token: Token,
    pub config: MapConfig,
    pub created_at: DateTime<Utc>,
    accesses: AtomicU64,
}

impl CompiledConfig {
    pub fn access_count(&self) -> u64 {
        self.accesses.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::Relaxed);
    }
}

/// Persisted form of a compiled entry.
///
/// The raw document is stored rather than the compiled model; parsing is
/// pure and deterministic, so read-through reconstruction is exact.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    token: String,
    created_at: DateTime<Utc>,
    config: Value,
}

type CompileState = Option<Result<(), RegistryError>>;

/// The compiled-configuration cache.
///
/// Registration is idempotent per content digest. Concurrent registrations
/// of the same digest share one compilation: the first caller spawns it,
/// later callers attach to the in-flight handle, and a waiter's
/// cancellation never aborts the compiler or the other waiters.
pub struct ConfigRegistry<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ConfigRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    store: S,
    ttl: Duration,
    entries: RwLock<HashMap<String, Arc<CompiledConfig>>>,
    inflight: Mutex<HashMap<String, watch::Receiver<CompileState>>>,
    compilations: AtomicU64,
}

impl<S> ConfigRegistry<S>
where
    S: ConfigStore + 'static,
{
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                ttl,
                entries: RwLock::new(HashMap::new()),
                inflight: Mutex::new(HashMap::new()),
                compilations: AtomicU64::new(0),
            }),
        }
    }

    /// Register a configuration, returning its deterministic token.
    ///
    /// Already-registered digests return immediately. Otherwise the
    /// configuration compiles exactly once, no matter how many callers
    /// arrive while compilation is in flight.
    pub async fn register(&self, scope: &str, raw: &Value) -> Result<Token, RegistryError> {
        let token = Token::derive(scope, raw);

        if self.inner.entries.read().await.contains_key(token.as_str()) {
            tracing::debug!(token = %token, "configuration already registered");
            return Ok(token);
        }

        let mut rx = {
            let mut inflight = self.inner.inflight.lock().await;
            // A compilation may have finished between the fast path and
            // taking the in-flight lock.
            if self.inner.entries.read().await.contains_key(token.as_str()) {
                return Ok(token);
            }
            match inflight.get(token.as_str()) {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(token.as_str().to_string(), rx.clone());
                    let inner = Arc::clone(&self.inner);
                    let task_token = token.clone();
                    let raw = raw.clone();
                    tokio::spawn(async move {
                        let result = compile(&inner, &task_token, raw).await;
                        inner.inflight.lock().await.remove(task_token.as_str());
                        let _ = tx.send(Some(result));
                    });
                    rx
                }
            }
        };

        // Awaiting here is the only suspension point a caller can cancel;
        // the spawned compiler and the other waiters continue regardless.
        loop {
            {
                let state = rx.borrow_and_update();
                if let Some(result) = state.as_ref() {
                    return result.clone().map(|_| token);
                }
            }
            if rx.changed().await.is_err() {
                return Err(RegistryError::StoreUnavailable(
                    "compilation task dropped".to_string(),
                ));
            }
        }
    }

    /// Resolve a token to its compiled configuration.
    ///
    /// Falls through to the backing store when the in-process entry is
    /// gone; a store miss means the entry was evicted and the caller must
    /// register again.
    pub async fn resolve(&self, token: &str) -> Result<Arc<CompiledConfig>, RegistryError> {
        if let Some(entry) = self.inner.entries.read().await.get(token) {
            entry.touch();
            tracing::debug!(token, "configuration cache hit");
            return Ok(Arc::clone(entry));
        }

        let bytes = self
            .inner
            .store
            .get(&store_key(token))
            .await
            .map_err(|e| RegistryError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| RegistryError::NotFound(token.to_string()))?;
        let stored: StoredEntry = serde_json::from_slice(&bytes)
            .map_err(|e| RegistryError::StoreUnavailable(format!("corrupt entry: {}", e)))?;
        let config = MapConfig::parse(&stored.config)?;

        let entry = Arc::new(CompiledConfig {
            token: Token::from(token),
            config,
            created_at: stored.created_at,
            accesses: AtomicU64::new(0),
        });
        self.inner
            .entries
            .write()
            .await
            .insert(token.to_string(), Arc::clone(&entry));
        entry.touch();
        tracing::debug!(token, "configuration loaded from store");
        Ok(entry)
    }

    /// Number of compilations performed; the external probe backing the
    /// de-duplication guarantee
    pub fn compile_count(&self) -> u64 {
        self.inner.compilations.load(Ordering::Relaxed)
    }
}

async fn compile<S: ConfigStore>(
    inner: &Inner<S>,
    token: &Token,
    raw: Value,
) -> Result<(), RegistryError> {
    inner.compilations.fetch_add(1, Ordering::Relaxed);
    let config = MapConfig::parse(&raw)?;
    let created_at = Utc::now();

    let stored = StoredEntry {
        token: token.as_str().to_string(),
        created_at,
        config: raw,
    };
    let bytes = serde_json::to_vec(&stored)
        .map_err(|e| RegistryError::StoreUnavailable(e.to_string()))?;
    inner
        .store
        .set(&store_key(token.as_str()), bytes, inner.ttl)
        .await
        .map_err(|e| RegistryError::StoreUnavailable(e.to_string()))?;

    let entry = Arc::new(CompiledConfig {
        token: token.clone(),
        config,
        created_at,
        accesses: AtomicU64::new(0),
    });
    inner
        .entries
        .write()
        .await
        .insert(token.as_str().to_string(), entry);
    tracing::debug!(token = %token, "configuration compiled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapconfig::ConfigError;
    use crate::registry::MemoryStore;
    use serde_json::json;

    fn config_doc() -> Value {
        json!({
            "analyses": [{ "id": "a0", "sql": "select 1" }],
            "dataviews": {
                "w": {
                    "type": "formula",
                    "source": { "id": "a0" },
                    "options": { "operation": "count", "column": "id" }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let registry = ConfigRegistry::new(MemoryStore::new());
        let token = registry.register("localhost", &config_doc()).await.unwrap();

        let entry = registry.resolve(token.as_str()).await.unwrap();
        assert_eq!(entry.token, token);
        assert!(entry.config.widget("w").is_some());
        assert_eq!(registry.compile_count(), 1);
    }

    #[tokio::test]
    async fn test_register_twice_compiles_once() {
        let registry = ConfigRegistry::new(MemoryStore::new());
        let first = registry.register("localhost", &config_doc()).await.unwrap();
        let second = registry.register("localhost", &config_doc()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.compile_count(), 1);
    }

    #[tokio::test]
    async fn test_register_invalid_config_fails() {
        let registry = ConfigRegistry::new(MemoryStore::new());
        let raw = json!({
            "dataviews": {
                "w": { "type": "heatmap", "source": { "id": "a0" }, "options": {} }
            }
        });
        let err = registry.register("localhost", &raw).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Config(ConfigError::UnknownWidgetType { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let registry = ConfigRegistry::new(MemoryStore::new());
        let err = registry.resolve("deadbeef").await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_counts_accesses() {
        let registry = ConfigRegistry::new(MemoryStore::new());
        let token = registry.register("localhost", &config_doc()).await.unwrap();

        let entry = registry.resolve(token.as_str()).await.unwrap();
        let before = entry.access_count();
        registry.resolve(token.as_str()).await.unwrap();
        assert_eq!(entry.access_count(), before + 1);
    }
}
