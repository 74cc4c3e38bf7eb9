//! Source file classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of data file, decided purely by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Sqlite,
    Csv,
    Parquet,
    Json,
    /// Newline-delimited JSON (.jsonl / .ndjson)
    Ndjson,
    Unknown,
}

impl FileType {
    /// Classify a path by its extension (case-insensitive).
    ///
    /// `Unknown` is not an error here; callers decide whether they can use it.
    ///
    /// # Examples
    ///
    /// ```
    /// use datafile_mcp_server::models::FileType;
    ///
    /// assert_eq!(FileType::classify("sales.CSV"), FileType::Csv);
    /// assert_eq!(FileType::classify("app.sqlite3"), FileType::Sqlite);
    /// assert_eq!(FileType::classify("notes.txt"), FileType::Unknown);
    /// ```
    pub fn classify(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "db" | "sqlite" | "sqlite3" => Self::Sqlite,
            "csv" => Self::Csv,
            "parquet" => Self::Parquet,
            "json" => Self::Json,
            "jsonl" | "ndjson" => Self::Ndjson,
            _ => Self::Unknown,
        }
    }

    /// True for formats served by the flat-file engine.
    pub fn is_flat_file(&self) -> bool {
        matches!(self, Self::Csv | Self::Parquet | Self::Json | Self::Ndjson)
    }

    /// Get the display name for this file type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Csv => "CSV",
            Self::Parquet => "Parquet",
            Self::Json => "JSON",
            Self::Ndjson => "NDJSON",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
