//! Data models for the datafile MCP server.
//!
//! This module re-exports all model types used throughout the application.

pub mod chart;
pub mod query;
pub mod schema;
pub mod source;

// Re-export commonly used types
pub use chart::{ColumnMapping, SeriesData, TableCell, TableData, TransformMode};
pub use query::{MAX_ROWS, QUERY_TIMEOUT_MS, QueryResult, Row};
pub use schema::{ColumnInfo, DatabaseSchema, TableSchema};
pub use source::FileType;
