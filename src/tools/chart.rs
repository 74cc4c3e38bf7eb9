//! Chart transformation tools.
//!
//! This module implements the `transform` and `query_chart` MCP tools. Both hand
//! back the `table` or `series` payload a visualization consumes verbatim.

use crate::error::{DataError, DataResult};
use crate::models::{ColumnMapping, QueryResult, Row, SeriesData, TableData, TransformMode};
use crate::source::QueryExecutor;
use crate::tools::transform::{Transformed, extract_labels, transform};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Input for the transform tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TransformInput {
    /// Column names, as returned by run_query
    pub columns: Vec<String>,
    /// Rows keyed by column name, as returned by run_query
    pub rows: Vec<Row>,
    /// "table" (default) or "series"
    #[serde(default)]
    pub mode: TransformMode,
    /// Column mapping. Required for series mode: xColumn and at least one yColumn.
    #[serde(default)]
    pub mapping: Option<ColumnMapping>,
    /// Also return the string form of each row's xColumn value, in row order
    #[serde(default)]
    pub include_labels: bool,
}

/// Input for the query_chart tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryChartInput {
    /// Path to the data file
    pub path: String,
    /// A single SELECT or WITH statement
    pub sql: String,
    /// "table" (default) or "series"
    #[serde(default)]
    pub mode: TransformMode,
    /// Column mapping. Required for series mode: xColumn and at least one yColumn.
    #[serde(default)]
    pub mapping: Option<ColumnMapping>,
    /// Also return the string form of each row's xColumn value, in row order
    #[serde(default)]
    pub include_labels: bool,
}

/// Output from the transform and query_chart tools.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct ChartOutput {
    /// Present in table mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableData>,
    /// Present in series mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<SeriesData>>,
    /// Present when include_labels is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_labels: Option<Vec<String>>,
    /// Number of source rows
    pub row_count: usize,
}

/// Handler for chart transformations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartToolHandler {
    executor: QueryExecutor,
}

impl ChartToolHandler {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Handle the transform tool call.
    pub fn transform(&self, input: TransformInput) -> DataResult<ChartOutput> {
        let result = QueryResult::new(input.columns, input.rows);
        let output = build_output(
            &result,
            input.mode,
            input.mapping.as_ref(),
            input.include_labels,
        )?;

        info!(mode = ?input.mode, row_count = output.row_count, "transform executed");
        Ok(output)
    }

    /// Handle the query_chart tool call: run_query followed by transform.
    pub async fn query_chart(&self, input: QueryChartInput) -> DataResult<ChartOutput> {
        let result = self.executor.run_query(&input.path, &input.sql).await?;
        let output = build_output(
            &result,
            input.mode,
            input.mapping.as_ref(),
            input.include_labels,
        )?;

        info!(
            path = %input.path,
            mode = ?input.mode,
            row_count = output.row_count,
            "query_chart executed"
        );
        Ok(output)
    }
}

fn build_output(
    result: &QueryResult,
    mode: TransformMode,
    mapping: Option<&ColumnMapping>,
    include_labels: bool,
) -> DataResult<ChartOutput> {
    let x_labels = if include_labels {
        Some(labels(result, mapping)?)
    } else {
        None
    };

    let mut output = ChartOutput {
        x_labels,
        row_count: result.row_count(),
        ..Default::default()
    };
    match transform(result, mode, mapping)? {
        Transformed::Table(table) => output.table = Some(table),
        Transformed::Series(series) => output.series = Some(series),
    }
    Ok(output)
}

fn labels(result: &QueryResult, mapping: Option<&ColumnMapping>) -> DataResult<Vec<String>> {
    let x_column = mapping
        .and_then(|m| m.x_column.as_deref())
        .ok_or_else(|| DataError::missing_column("xColumn is required when include_labels is set"))?;

    if !result.has_column(x_column) {
        return Err(DataError::missing_column(format!(
            "xColumn '{}' not found in query results",
            x_column
        )));
    }
    Ok(extract_labels(&result.rows, x_column))
}
