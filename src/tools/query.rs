//! Query execution tool.
//!
//! This module implements the `run_query` MCP tool. Statements are validated as
//! read-only before any engine session is opened.

use crate::error::DataResult;
use crate::models::{QueryResult, Row};
use crate::source::QueryExecutor;
use crate::tools::format::{OutputFormat, format_as_markdown, format_as_table};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Input for the run_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RunQueryInput {
    /// Path to a .db/.sqlite/.sqlite3, .csv, .parquet, .json, .jsonl or .ndjson file
    pub path: String,
    /// A single SELECT or WITH statement. Flat files are queried by their file name without extension.
    pub sql: String,
    /// Output format: "json" returns columns and rows, "table" an ASCII table, "markdown" a markdown table
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output from the run_query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunQueryOutput {
    /// Column names in result order. Omitted if format is table/markdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Result rows keyed by column name. Omitted if format is table/markdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    /// Pre-formatted output when format is table or markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    /// Number of rows returned
    pub row_count: usize,
    /// Query execution time in milliseconds
    pub execution_time_ms: u64,
}

impl RunQueryOutput {
    /// Create output from a query result in the requested format.
    pub fn from_result(result: QueryResult, format: OutputFormat, execution_time_ms: u64) -> Self {
        let row_count = result.row_count();

        let formatted = match format {
            OutputFormat::Json => {
                return Self {
                    columns: Some(result.columns),
                    rows: Some(result.rows),
                    formatted: None,
                    row_count,
                    execution_time_ms,
                };
            }
            OutputFormat::Table => format_as_table(&result.columns, &result.rows, execution_time_ms),
            OutputFormat::Markdown => format_as_markdown(&result.columns, &result.rows),
        };

        Self {
            columns: None,
            rows: None,
            formatted: Some(formatted),
            row_count,
            execution_time_ms,
        }
    }
}

/// Handler for query execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryToolHandler {
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Handle the run_query tool call.
    pub async fn run_query(&self, input: RunQueryInput) -> DataResult<RunQueryOutput> {
        let start = Instant::now();
        let result = self.executor.run_query(&input.path, &input.sql).await?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            path = %input.path,
            row_count = result.row_count(),
            execution_time_ms = execution_time_ms,
            "run_query executed"
        );

        Ok(RunQueryOutput::from_result(result, input.format, execution_time_ms))
    }
}
