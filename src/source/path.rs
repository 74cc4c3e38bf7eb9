//! Path resolution for data sources.

use crate::error::{DataError, DataResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve `path` against the process working directory and require a regular file there.
///
/// Every entry point calls this; a path validated by an earlier call is not trusted.
pub fn resolve(path: &str) -> DataResult<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(DataError::invalid_input("path must not be empty"));
    }

    let cwd = std::env::current_dir()
        .map_err(|e| DataError::internal(format!("Cannot read working directory: {}", e)))?;
    let joined = cwd.join(Path::new(trimmed));

    if !joined.is_file() {
        return Err(DataError::not_found(path));
    }

    let resolved = joined.canonicalize().map_err(|_| DataError::not_found(path))?;
    debug!(path = %resolved.display(), "Resolved data source path");
    Ok(resolved)
}

/// Relation name for a single-file source: the file name with its extension stripped.
pub fn relation_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("data")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sales.csv");
        std::fs::write(&file, "a\n1\n").unwrap();

        let resolved = resolve(file.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved.file_name().unwrap(), "sales.csv");
    }

    #[test]
    fn test_resolve_missing_file() {
        let err = resolve("/definitely/not/here.db").unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
        assert!(err.to_string().contains("/definitely/not/here.db"));
    }

    #[test]
    fn test_resolve_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_empty_path() {
        assert!(matches!(resolve("  "), Err(DataError::InvalidInput { .. })));
    }

    #[test]
    fn test_relation_name_strips_extension() {
        assert_eq!(relation_name(Path::new("/tmp/sales_2024.csv")), "sales_2024");
        assert_eq!(relation_name(Path::new("events.ndjson")), "events");
        assert_eq!(relation_name(Path::new("data.backup.parquet")), "data.backup");
    }
}
