//! Schema introspection tool.
//!
//! This module implements the `get_schema` MCP tool.

use crate::error::DataResult;
use crate::models::{FileType, TableSchema};
use crate::source::SchemaInspector;
use crate::source::path;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Input for the get_schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSchemaInput {
    /// Path to the data file, absolute or relative to the server's working directory
    pub path: String,
}

/// Output from the get_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetSchemaOutput {
    /// How the file was classified
    pub file_type: FileType,
    /// Tables with their columns. Flat files expose a single table named after the file.
    pub tables: Vec<TableSchema>,
    pub table_count: usize,
    /// File size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Human-readable file size (e.g., "1.5 MB")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_formatted: Option<String>,
}

/// Format bytes as human-readable size string.
///
/// # Examples
///
/// ```
/// use datafile_mcp_server::tools::schema::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1048576), "1 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Handler for schema introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaToolHandler {
    inspector: SchemaInspector,
}

impl SchemaToolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle the get_schema tool call.
    pub async fn get_schema(&self, input: GetSchemaInput) -> DataResult<GetSchemaOutput> {
        let (file_type, schema) = self.inspector.inspect(&input.path).await?;

        let size_bytes = path::resolve(&input.path)
            .ok()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len());

        info!(
            path = %input.path,
            file_type = %file_type,
            table_count = schema.tables.len(),
            "get_schema executed"
        );

        Ok(GetSchemaOutput {
            file_type,
            table_count: schema.tables.len(),
            tables: schema.tables,
            size_bytes,
            size_formatted: size_bytes.map(format_size),
        })
    }
}
