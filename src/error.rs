//! Error types for the datafile MCP server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each variant carries a message naming the offending path, keyword, column or value
//! so an AI assistant can correct its next call without guessing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("File does not exist: {path}")]
    NotFound { path: String },

    #[error("Unsupported file format '{extension}' for {path}")]
    UnsupportedFormat { path: String, extension: String },

    #[error("Query is not read-only: {reason}")]
    NotReadOnly { reason: String },

    #[error("Query returned more than {limit} rows")]
    RowLimitExceeded { limit: usize },

    #[error("Query failed: {message}")]
    Query { message: String, suggestion: String },

    #[error("Missing column: {message}")]
    MissingColumn { message: String },

    #[error("Cannot convert value to number: {value}")]
    ValueCoercion { value: String },

    #[error("Schema introspection failed for {path}: {message}")]
    Introspection { path: String, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DataError {
    /// Create a not-found error for a path as the caller supplied it.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(path: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            extension: extension.into(),
        }
    }

    /// Create a read-only violation error.
    pub fn not_read_only(reason: impl Into<String>) -> Self {
        Self::NotReadOnly {
            reason: reason.into(),
        }
    }

    /// Create a row limit error.
    pub fn row_limit_exceeded(limit: usize) -> Self {
        Self::RowLimitExceeded { limit }
    }

    /// Create a query error with a helpful suggestion.
    pub fn query(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query timeout error.
    pub fn query_timeout(timeout_ms: u64) -> Self {
        Self::query(
            format!("Query exceeded timeout of {} ms", timeout_ms),
            "Narrow the query with WHERE, LIMIT or pre-aggregation",
        )
    }

    /// Create a missing column error.
    pub fn missing_column(message: impl Into<String>) -> Self {
        Self::MissingColumn {
            message: message.into(),
        }
    }

    /// Create a value coercion error.
    pub fn value_coercion(value: impl Into<String>) -> Self {
        Self::ValueCoercion {
            value: value.into(),
        }
    }

    /// Create an introspection error.
    pub fn introspection(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Introspection {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Query { suggestion, .. } => Some(suggestion),
            Self::NotFound { .. } => Some("Check the path; relative paths resolve against the server's working directory"),
            Self::UnsupportedFormat { .. } => {
                Some("Supported extensions: .db, .sqlite, .sqlite3, .csv, .parquet, .json, .jsonl, .ndjson")
            }
            Self::NotReadOnly { .. } => Some("Only a single SELECT or WITH query is allowed"),
            Self::RowLimitExceeded { .. } => {
                Some("Add a LIMIT clause or aggregate the data before charting")
            }
            Self::MissingColumn { .. } => Some("Use column names exactly as returned by run_query"),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Queries are not assumed to be idempotent or cheap, so nothing is.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for pipeline operations.
pub type DataResult<T> = Result<T, DataError>;

/// Convert sqlx errors raised while executing a user query.
impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DataError::query(
                db_err.message(),
                "Check the SQL syntax and referenced tables (see get_schema)",
            ),
            sqlx::Error::Io(io_err) => DataError::query(
                format!("I/O error: {}", io_err),
                "Check that the file is readable",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DataError::query(format!("Column not found: {}", col), "Check column names")
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DataError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DataError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DataError::internal("SQLite worker crashed"),
            _ => DataError::query(err.to_string(), "Check the SQL and the source file"),
        }
    }
}

/// Convert DuckDB errors raised while executing a user query.
impl From<duckdb::Error> for DataError {
    fn from(err: duckdb::Error) -> Self {
        DataError::query(
            err.to_string(),
            "Check the SQL syntax; flat files are exposed as a relation named after the file",
        )
    }
}

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DataError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<DataError> for rmcp::ErrorData {
    fn from(err: DataError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            DataError::NotFound { .. } => rmcp::ErrorData::resource_not_found(err.to_string(), data),

            DataError::UnsupportedFormat { .. }
            | DataError::NotReadOnly { .. }
            | DataError::RowLimitExceeded { .. }
            | DataError::Query { .. }
            | DataError::MissingColumn { .. }
            | DataError::ValueCoercion { .. }
            | DataError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }

            DataError::Introspection { .. } | DataError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_offender() {
        let err = DataError::not_read_only("forbidden keyword DROP");
        assert!(err.to_string().contains("DROP"));

        let err = DataError::value_coercion("abc");
        assert!(err.to_string().contains("abc"));

        let err = DataError::row_limit_exceeded(10000);
        assert!(err.to_string().contains("10000"));
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!DataError::query_timeout(5000).is_retryable());
        assert!(!DataError::query("syntax error", "check syntax").is_retryable());
        assert!(!DataError::not_found("x.csv").is_retryable());
    }

    #[test]
    fn test_timeout_message() {
        let err = DataError::query_timeout(5000);
        assert!(matches!(err, DataError::Query { .. }));
        assert!(err.to_string().contains("5000 ms"));
    }

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let mcp_err: rmcp::ErrorData = DataError::not_found("missing.db").into();
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_client_errors_map_to_invalid_params() {
        let errors = vec![
            DataError::unsupported_format("a.txt", "txt"),
            DataError::not_read_only("DROP"),
            DataError::row_limit_exceeded(10000),
            DataError::query("no such table: t", "check"),
            DataError::missing_column("xColumn is required"),
            DataError::value_coercion("abc"),
            DataError::invalid_input("bad"),
        ];
        for err in errors {
            let mcp_err: rmcp::ErrorData = err.into();
            assert_eq!(mcp_err.code.0, -32602);
        }
    }

    #[test]
    fn test_internal_maps_to_internal_error() {
        let mcp_err: rmcp::ErrorData = DataError::introspection("a.db", "corrupt").into();
        assert_eq!(mcp_err.code.0, -32603);
        let mcp_err: rmcp::ErrorData = DataError::internal("boom").into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_query_error_includes_suggestion_in_data() {
        let err = DataError::query("syntax error", "check syntax");
        let mcp_err: rmcp::ErrorData = err.into();
        let data = mcp_err.data.unwrap();
        assert_eq!(data["suggestion"], "check syntax");
    }
}
