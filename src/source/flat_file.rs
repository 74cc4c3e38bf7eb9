//! Flat-file sessions backed by an in-memory DuckDB database.
//!
//! The file is exposed as a view named after its stem, so `sales.csv` is queried
//! as `SELECT ... FROM sales`. DuckDB calls block, so every session runs on
//! tokio's blocking pool.

use super::path::relation_name;
use super::sqlite::quote_ident;
use super::types::duckdb::value_to_json;
use super::types::unique_column_names;
use crate::error::{DataError, DataResult};
use crate::models::{ColumnInfo, FileType, MAX_ROWS, QUERY_TIMEOUT_MS, QueryResult, Row, TableSchema};
use duckdb::Connection;
use duckdb::types::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Quote a string literal for interpolation into SQL.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Table function that reads `path` in the given format.
fn reader_call(path: &Path, file_type: FileType) -> DataResult<String> {
    let literal = path
        .to_str()
        .map(quote_literal)
        .ok_or_else(|| DataError::invalid_input(format!("Path is not valid UTF-8: {}", path.display())))?;

    match file_type {
        FileType::Csv => Ok(format!("read_csv_auto({})", literal)),
        FileType::Parquet => Ok(format!("read_parquet({})", literal)),
        FileType::Json => Ok(format!("read_json_auto({})", literal)),
        FileType::Ndjson => Ok(format!(
            "read_json_auto({}, format = 'newline_delimited')",
            literal
        )),
        FileType::Sqlite | FileType::Unknown => Err(DataError::unsupported_format(
            path.display().to_string(),
            file_type.display_name(),
        )),
    }
}

/// Create the stem-named view over the file. Returns the relation name.
fn bind_view(conn: &Connection, path: &Path, file_type: FileType) -> DataResult<String> {
    let name = relation_name(path);
    let sql = format!(
        "CREATE VIEW {} AS SELECT * FROM {}",
        quote_ident(&name),
        reader_call(path, file_type)?
    );
    conn.execute_batch(&sql)?;
    debug!(relation = %name, format = %file_type, "Bound flat file view");
    Ok(name)
}

fn join_error(err: tokio::task::JoinError) -> DataError {
    DataError::internal(format!("DuckDB worker failed: {}", err))
}

// =============================================================================
// Schema
// =============================================================================

/// Describe the single relation exposed by the file.
pub async fn inspect(path: &Path, file_type: FileType) -> DataResult<TableSchema> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || inspect_blocking(&owned, file_type))
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            DataError::Query { message, .. } => {
                DataError::introspection(path.display().to_string(), message)
            }
            other => other,
        })
}

fn inspect_blocking(path: &Path, file_type: FileType) -> DataResult<TableSchema> {
    let conn = Connection::open_in_memory()?;
    let name = bind_view(&conn, path, file_type)?;

    let mut stmt = conn.prepare(&format!("DESCRIBE SELECT * FROM {}", quote_ident(&name)))?;
    let columns = stmt
        .query_map([], |row| {
            let column_name: String = row.get(0)?;
            let column_type: String = row.get(1)?;
            let null: Option<String> = row.get(2)?;
            let key: Option<String> = row.get(3)?;
            let default: Option<String> = row.get(4)?;

            let column = ColumnInfo::new(column_name, column_type)
                .with_not_null(null.as_deref() == Some("NO"))
                .with_primary_key(key.as_deref() == Some("PRI"));
            Ok(match default {
                Some(d) => column.with_default(d),
                None => column,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TableSchema::new(name, columns))
}

// =============================================================================
// Query Execution
// =============================================================================

/// Run a validated query against the file's view.
///
/// On timeout the connection is interrupted and the worker joined before the
/// error is returned, so no query outlives the call.
pub async fn execute(path: &Path, file_type: FileType, sql: &str) -> DataResult<QueryResult> {
    let (handle_tx, handle_rx) = oneshot::channel();

    let owned_path: PathBuf = path.to_path_buf();
    let owned_sql = sql.to_string();
    let mut task = tokio::task::spawn_blocking(move || -> DataResult<QueryResult> {
        let conn = Connection::open_in_memory()?;
        let _ = handle_tx.send(conn.interrupt_handle());
        execute_blocking(conn, &owned_path, file_type, &owned_sql)
    });

    match timeout(Duration::from_millis(QUERY_TIMEOUT_MS), &mut task).await {
        Ok(joined) => joined.map_err(join_error)?,
        Err(_) => {
            warn!(path = %path.display(), "Interrupting DuckDB query after timeout");
            // The sender is dropped unsent only if the session never opened.
            if let Ok(interrupt) = handle_rx.await {
                interrupt.interrupt();
            }
            let _ = task.await;
            Err(DataError::query_timeout(QUERY_TIMEOUT_MS))
        }
    }
}

fn execute_blocking(
    conn: Connection,
    path: &Path,
    file_type: FileType,
    sql: &str,
) -> DataResult<QueryResult> {
    bind_view(&conn, path, file_type)?;

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let columns = unique_column_names(rows.as_ref().map(|s| s.column_names()).unwrap_or_default());

    let mut out: Vec<Row> = Vec::new();
    while let Some(row) = rows.next()? {
        if out.len() == MAX_ROWS {
            return Err(DataError::row_limit_exceeded(MAX_ROWS));
        }
        let mut map = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            let value: Value = row.get(idx)?;
            map.insert(name.clone(), value_to_json(value));
        }
        out.push(map);
    }

    debug!(rows = out.len(), columns = columns.len(), "DuckDB query complete");
    Ok(QueryResult::new(columns, out))
}
