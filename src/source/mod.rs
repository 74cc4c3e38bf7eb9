//! Data source layer.
//!
//! This module turns a caller-supplied path into an engine session:
//! - `path`: resolution against the working directory
//! - `sqlite`: read-only SQLite sessions (sqlx)
//! - `flat_file`: CSV / Parquet / JSON / NDJSON through in-memory DuckDB
//! - `types`: engine value to JSON conversion
//!
//! [`SchemaInspector`] and [`QueryExecutor`] are the entry points; both open a
//! fresh session per call and never share one across calls.

mod executor;
mod flat_file;
pub mod path;
mod schema;
mod sqlite;
pub mod types;

pub use executor::QueryExecutor;
pub use schema::SchemaInspector;

use crate::error::{DataError, DataResult};
use crate::models::{DatabaseSchema, FileType, QueryResult};
use crate::tools::guard::{SqlEngine, require_single_statement};
use std::path::{Path, PathBuf};

/// A resolved, classified data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Sqlite(PathBuf),
    FlatFile { path: PathBuf, file_type: FileType },
}

impl DataSource {
    /// Resolve and classify `path`. Fails for missing files and unknown extensions.
    pub fn open(path: &str) -> DataResult<Self> {
        let resolved = path::resolve(path)?;
        let file_type = FileType::classify(&resolved);

        match file_type {
            FileType::Sqlite => Ok(Self::Sqlite(resolved)),
            FileType::Unknown => {
                let extension = resolved
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string();
                Err(DataError::unsupported_format(path, extension))
            }
            _ => Ok(Self::FlatFile {
                path: resolved,
                file_type,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Sqlite(path) => path,
            Self::FlatFile { path, .. } => path,
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            Self::Sqlite(_) => FileType::Sqlite,
            Self::FlatFile { file_type, .. } => *file_type,
        }
    }

    pub fn engine(&self) -> SqlEngine {
        match self {
            Self::Sqlite(_) => SqlEngine::Sqlite,
            Self::FlatFile { .. } => SqlEngine::DuckDb,
        }
    }

    /// Introspect the source.
    pub async fn schema(&self) -> DataResult<DatabaseSchema> {
        match self {
            Self::Sqlite(path) => Ok(DatabaseSchema::new(sqlite::inspect(path).await?)),
            Self::FlatFile { path, file_type } => Ok(DatabaseSchema::new(vec![
                flat_file::inspect(path, *file_type).await?,
            ])),
        }
    }

    /// Execute an already-validated statement.
    ///
    /// Input holding more than one statement is rejected here for both engines,
    /// whatever guard mode ran before.
    pub async fn execute(&self, sql: &str) -> DataResult<QueryResult> {
        require_single_statement(sql, self.engine())?;
        match self {
            Self::Sqlite(path) => sqlite::execute(path, sql).await,
            Self::FlatFile { path, file_type } => flat_file::execute(path, *file_type, sql).await,
        }
    }
}
