//! Schema introspection across source formats.

use super::DataSource;
use crate::error::DataResult;
use crate::models::{DatabaseSchema, FileType};
use tracing::info;

/// Produces a normalized schema for any supported file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInspector;

impl SchemaInspector {
    pub fn new() -> Self {
        Self
    }

    /// Normalized schema of the file at `path`.
    pub async fn get_schema(&self, path: &str) -> DataResult<DatabaseSchema> {
        self.inspect(path).await.map(|(_, schema)| schema)
    }

    /// Like [`get_schema`](Self::get_schema), also reporting how the file was classified.
    pub async fn inspect(&self, path: &str) -> DataResult<(FileType, DatabaseSchema)> {
        let source = DataSource::open(path)?;
        let schema = source.schema().await?;

        info!(
            path = %source.path().display(),
            file_type = %source.file_type(),
            tables = schema.tables.len(),
            "Inspected schema"
        );
        Ok((source.file_type(), schema))
    }
}
