//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};

use tilestats::registry::{ConfigStore, MemoryStore, StoreError};
use tilestats::{EngineError, QueryEngine, Row, WidgetService};

/// The reference map configuration: a places dataset with a category
/// aggregation and a histogram sharing one source
pub fn places_config() -> Value {
    json!({
        "version": "1.5.0",
        "layers": [
            {
                "type": "mapnik",
                "options": {
                    "cartocss": "#layer { marker-fill: red; }",
                    "cartocss_version": "2.3.0",
                    "source": { "id": "a0" }
                }
            }
        ],
        "analyses": [
            { "id": "a0", "sql": "select * from populated_places_simple_reduced" }
        ],
        "dataviews": {
            "country_places_count": {
                "type": "aggregation",
                "source": { "id": "a0" },
                "options": { "column": "adm0_a3", "aggregation": "count" }
            },
            "country_places_histogram": {
                "type": "histogram",
                "source": { "id": "a0" },
                "options": { "column": "pop_max" }
            }
        }
    })
}

/// Legacy-form configuration with an inline list widget
pub fn list_config() -> Value {
    json!({
        "version": "1.5.0",
        "layers": [
            {
                "type": "mapnik",
                "options": {
                    "sql": "select * from test_table",
                    "cartocss": "#layer { marker-fill: red; }",
                    "cartocss_version": "2.3.0",
                    "widgets": {
                        "names": {
                            "type": "list",
                            "options": { "columns": ["name"] }
                        }
                    }
                }
            }
        ]
    })
}

/// A scripted query engine: returns queued responses and records every SQL
/// statement it receives
#[derive(Default)]
pub struct MockEngine {
    responses: Mutex<VecDeque<Result<Vec<Row>, EngineError>>>,
    captured: Mutex<Vec<String>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response of JSON-object rows
    pub fn push_rows(&self, rows: Vec<Value>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(rows.into_iter().map(Row::from).collect()));
    }

    pub fn push_error(&self, err: EngineError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// Every SQL statement executed so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> String {
        self.captured.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn query_count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }
}

impl QueryEngine for MockEngine {
    fn execute(&self, sql: &str) -> BoxFuture<'_, Result<Vec<Row>, EngineError>> {
        let sql = sql.to_string();
        async move {
            self.captured.lock().unwrap().push(sql);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }
        .boxed()
    }
}

/// A store whose writes take a while, widening the single-flight window
pub struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }
}

impl ConfigStore for SlowStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        async move {
            tokio::time::sleep(self.delay).await;
            self.inner.set(&key, value, ttl).await
        }
        .boxed()
    }
}

/// A store that fails a configurable number of writes before recovering
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: Mutex<usize>,
}

impl FlakyStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures_left: Mutex::new(failures),
        }
    }
}

impl ConfigStore for FlakyStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        async move {
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(StoreError::Unavailable("connection refused".to_string()));
                }
            }
            self.inner.set(&key, value, ttl).await
        }
        .boxed()
    }
}

/// Service over a mock engine and an in-memory store
pub fn service() -> (WidgetService<Arc<MockEngine>, MemoryStore>, Arc<MockEngine>) {
    let engine = MockEngine::new();
    let service = WidgetService::new(Arc::clone(&engine), MemoryStore::new());
    (service, engine)
}

/// Canned aggregation rows matching the places dataset with CHN rejected
pub fn places_rows_without_chn() -> Vec<Value> {
    vec![
        json!({ "category": "USA", "value": 769 }),
        json!({ "category": "IND", "value": 475 }),
        json!({ "category": "RUS", "value": 432 }),
        json!({ "category": "BRA", "value": 396 }),
        json!({ "category": "CAN", "value": 256 }),
    ]
}
