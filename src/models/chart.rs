//! Chart-ready output models.
//!
//! These are the payloads handed to a visualization: named (x, y) series and
//! positional tables.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target shape of a transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Flat table with headers and positional rows
    #[default]
    Table,
    /// One or more named (x, y) series
    Series,
}

/// Caller instructions for projecting query rows into series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    /// Column used for x positions (required for series)
    #[serde(default)]
    pub x_column: Option<String>,
    /// Columns used for y values; with a series/group column only the first is used
    #[serde(default)]
    pub y_columns: Option<Vec<String>>,
    /// Split rows into one series per distinct value of this column
    #[serde(default)]
    pub series_column: Option<String>,
    /// Same grouping behavior as series_column
    #[serde(default)]
    pub group_by_column: Option<String>,
}

impl ColumnMapping {
    /// Create a mapping with an x column and y columns.
    pub fn new<I, S>(x_column: impl Into<String>, y_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            x_column: Some(x_column.into()),
            y_columns: Some(y_columns.into_iter().map(Into::into).collect()),
            series_column: None,
            group_by_column: None,
        }
    }

    /// Set the series column.
    pub fn with_series_column(mut self, column: impl Into<String>) -> Self {
        self.series_column = Some(column.into());
        self
    }

    /// Set the group-by column.
    pub fn with_group_by_column(mut self, column: impl Into<String>) -> Self {
        self.group_by_column = Some(column.into());
        self
    }

    /// Column that partitions rows into series, if any. `series_column` wins over `group_by_column`.
    pub fn grouping_column(&self) -> Option<&str> {
        self.series_column
            .as_deref()
            .or(self.group_by_column.as_deref())
    }
}

/// A named sequence of (x, y) points, sorted ascending by x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeriesData {
    pub name: String,
    /// `[x, y]` pairs
    pub data: Vec<[f64; 2]>,
}

impl SeriesData {
    pub fn new(name: impl Into<String>, data: Vec<[f64; 2]>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TableCell {
    Number(serde_json::Number),
    Text(String),
    /// SQL NULL
    Null,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}
