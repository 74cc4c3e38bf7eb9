//! Query-related data models.
//!
//! This module defines query results and the limits that bound them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum number of rows a query may return. Larger results fail; they are never truncated.
pub const MAX_ROWS: usize = 10_000;

/// Hard execution bound for a single query, in milliseconds.
pub const QUERY_TIMEOUT_MS: u64 = 5_000;

/// A result row: column name to JSON value.
pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// Column names in engine order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether a column is part of the result.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}
