//! External query-engine contract
//!
//! The widget computation engine hands generated SQL to an implementation
//! of [`QueryEngine`] and gets JSON rows back. Connection pooling, retries
//! and timeouts belong to the implementation; a pool's "busy" condition
//! surfaces here as an error, never as internal queuing.

use std::fmt;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

/// A single result row: column name to JSON value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Numeric value of a column, if present and numeric
    pub fn f64_value(&self, column: &str) -> Option<f64> {
        self.0.get(column).and_then(Value::as_f64)
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Value> for Row {
    /// Build a row from a JSON object; non-objects become empty rows
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Row(map),
            _ => Row(Map::new()),
        }
    }
}

/// Executes generated SQL against the backing datastore.
///
/// Exactly one call is made per widget request. Dropping the returned
/// future cancels the in-flight query as far as the implementation allows.
pub trait QueryEngine: Send + Sync {
    fn execute(&self, sql: &str) -> BoxFuture<'_, Result<Vec<Row>, EngineError>>;
}

impl<T: QueryEngine + ?Sized> QueryEngine for std::sync::Arc<T> {
    fn execute(&self, sql: &str) -> BoxFuture<'_, Result<Vec<Row>, EngineError>> {
        (**self).execute(sql)
    }
}

/// Query-engine failures, surfaced to the caller without retry
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The connection pool refused the query
    Busy(String),
    /// The datastore rejected or failed the query
    Query(String),
    /// The datastore could not be reached or dropped the connection
    Connection(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Busy(detail) => write!(f, "Query engine busy: {}", detail),
            EngineError::Query(detail) => write!(f, "Query failed: {}", detail),
            EngineError::Connection(detail) => write!(f, "Query engine unreachable: {}", detail),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_accessors() {
        let row = Row::from(json!({ "category": "USA", "value": 769 }));
        assert_eq!(row.get("category"), Some(&json!("USA")));
        assert_eq!(row.f64_value("value"), Some(769.0));
        assert_eq!(row.f64_value("category"), None);
        assert_eq!(row.f64_value("missing"), None);
    }

    #[test]
    fn test_row_from_non_object_is_empty() {
        let row = Row::from(json!([1, 2, 3]));
        assert_eq!(row, Row::default());
    }
}
