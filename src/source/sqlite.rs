//! SQLite sessions.
//!
//! Each call opens a fresh read-only connection to the database file and closes
//! it before returning, whatever the outcome.

use super::types::sqlite::{column_names, row_to_json};
use super::types::unique_column_names;
use crate::error::{DataError, DataResult};
use crate::models::{ColumnInfo, MAX_ROWS, QUERY_TIMEOUT_MS, QueryResult, TableSchema};
use futures_util::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// VM instructions between deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Open a read-only connection. The file must already exist.
async fn open(path: &Path) -> DataResult<SqliteConnection> {
    SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false)
        .disable_statement_logging()
        .connect()
        .await
        .map_err(DataError::from)
}

/// Quote an identifier for interpolation into SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// =============================================================================
// Schema
// =============================================================================

/// Introspect every user table of the database, alphabetically.
pub async fn inspect(path: &Path) -> DataResult<Vec<TableSchema>> {
    let mut conn = open(path)
        .await
        .map_err(|e| DataError::introspection(path.display().to_string(), e.to_string()))?;

    let result = inspect_tables(&mut conn).await;
    let _ = conn.close().await;

    result.map_err(|e| DataError::introspection(path.display().to_string(), e.to_string()))
}

async fn inspect_tables(conn: &mut SqliteConnection) -> Result<Vec<TableSchema>, sqlx::Error> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' \
         ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let columns = describe_table(conn, &name).await?;
        debug!(table = %name, columns = columns.len(), "Described SQLite table");
        tables.push(TableSchema::new(name, columns));
    }
    Ok(tables)
}

async fn describe_table(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    // Zero-row probe: prepared only, never stepped.
    let probe = format!("SELECT * FROM {} LIMIT 0", quote_ident(table));
    let projected: Vec<String> = {
        let stmt = (&mut *conn).prepare(&probe).await?;
        stmt.columns().iter().map(|c| c.name().to_string()).collect()
    };

    let pragma = format!("PRAGMA table_info({})", quote_ident(table));
    let catalog = sqlx::query(&pragma).fetch_all(&mut *conn).await?;

    let mut columns = Vec::with_capacity(projected.len());
    for name in projected {
        let entry = catalog
            .iter()
            .find(|row| row.try_get::<String, _>("name").is_ok_and(|n| n == name));

        let column = match entry {
            Some(row) => {
                let data_type: String = row.try_get("type").unwrap_or_default();
                let not_null: i64 = row.try_get("notnull").unwrap_or(0);
                let pk: i64 = row.try_get("pk").unwrap_or(0);
                let default: Option<String> = row.try_get("dflt_value").ok().flatten();

                let column = ColumnInfo::new(name, data_type)
                    .with_not_null(not_null != 0)
                    .with_primary_key(pk > 0);
                match default {
                    Some(d) => column.with_default(d),
                    None => column,
                }
            }
            None => ColumnInfo::new(name, ""),
        };
        columns.push(column);
    }
    Ok(columns)
}

// =============================================================================
// Query Execution
// =============================================================================

/// Run a validated query against the database file.
pub async fn execute(path: &Path, sql: &str) -> DataResult<QueryResult> {
    let mut conn = open(path).await?;
    let result = execute_bounded(&mut conn, sql).await;
    let _ = conn.close().await;
    result
}

async fn execute_bounded(conn: &mut SqliteConnection, sql: &str) -> DataResult<QueryResult> {
    let limit = Duration::from_millis(QUERY_TIMEOUT_MS);
    let deadline = Instant::now() + limit;

    {
        let mut handle = conn.lock_handle().await?;
        handle.set_progress_handler(PROGRESS_INTERVAL, move || Instant::now() < deadline);
    }

    match timeout(limit, fetch(conn, sql)).await {
        Ok(Err(_)) if Instant::now() >= deadline => Err(DataError::query_timeout(QUERY_TIMEOUT_MS)),
        Ok(result) => result,
        Err(_) => Err(DataError::query_timeout(QUERY_TIMEOUT_MS)),
    }
}

async fn fetch(conn: &mut SqliteConnection, sql: &str) -> DataResult<QueryResult> {
    let mut columns = Vec::new();
    let mut rows = Vec::new();

    {
        let mut stream = (&mut *conn).fetch(sql);
        while let Some(row) = stream.try_next().await? {
            if rows.len() == MAX_ROWS {
                return Err(DataError::row_limit_exceeded(MAX_ROWS));
            }
            if columns.is_empty() {
                columns = column_names(&row);
            }
            rows.push(row_to_json(&row, &columns));
        }
    }

    if rows.is_empty() {
        // No rows to read names from; ask the prepared statement instead.
        if let Ok(stmt) = (&mut *conn).prepare(sql).await {
            columns =
                unique_column_names(stmt.columns().iter().map(|c| c.name().to_string()).collect());
        }
    }

    debug!(rows = rows.len(), columns = columns.len(), "SQLite query complete");
    Ok(QueryResult::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("sales"), "\"sales\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
