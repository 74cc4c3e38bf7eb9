//! Guarded query execution.

use super::DataSource;
use crate::error::DataResult;
use crate::models::QueryResult;
use crate::tools::guard::QueryGuard;
use std::time::Instant;
use tracing::{debug, info};

/// Runs read-only queries with the row cap and timeout enforced by each session.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor {
    guard: QueryGuard,
}

impl QueryExecutor {
    /// Create an executor using the keyword guard only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor with an explicit guard.
    pub fn with_guard(guard: QueryGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> QueryGuard {
        self.guard
    }

    /// Resolve, classify, validate, then execute `sql` against the file at `path`.
    ///
    /// The guard runs on every call; nothing about a previous call is trusted.
    pub async fn run_query(&self, path: &str, sql: &str) -> DataResult<QueryResult> {
        let start = Instant::now();
        let source = DataSource::open(path)?;
        self.guard.validate(sql, source.engine())?;

        debug!(
            path = %source.path().display(),
            file_type = %source.file_type(),
            sql = %sql,
            "Executing query"
        );
        let result = source.execute(sql).await?;

        info!(
            file_type = %source.file_type(),
            rows = result.row_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query complete"
        );
        Ok(result)
    }
}
