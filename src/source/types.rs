//! Engine value to JSON mappings.
//!
//! This module normalizes values coming out of either engine into JSON so that
//! every downstream consumer sees one representation.
//!
//! # Architecture
//!
//! Conversion uses a two-phase approach for SQLite:
//! 1. `StorageClass` classifies the value's runtime storage class
//! 2. Class-specific decoders handle the actual value extraction
//!
//! DuckDB values arrive already typed (`duckdb::types::Value`) and are mapped directly.
//! Integers wider than 64 bits and decimals are narrowed to f64; precision loss
//! above 2^53 is accepted.

use crate::models::Row;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

// =============================================================================
// Storage Classification
// =============================================================================

/// Runtime storage class of a SQLite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Integer,
    Real,
    Text,
    Blob,
    Null,
}

/// Classify a SQLite type name into a storage class.
///
/// Accepts the runtime names reported for values ("INTEGER", "REAL", ...) as well as
/// declared column types, using SQLite's affinity rules for the latter.
pub fn storage_class(type_name: &str) -> StorageClass {
    let upper = type_name.to_uppercase();

    if upper.is_empty() || upper == "NULL" {
        return StorageClass::Null;
    }
    if upper.contains("INT") || upper == "BOOLEAN" {
        return StorageClass::Integer;
    }
    if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        return StorageClass::Text;
    }
    if upper.contains("BLOB") {
        return StorageClass::Blob;
    }
    if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        return StorageClass::Real;
    }

    // NUMERIC affinity, dates stored as text, etc.
    StorageClass::Text
}

// =============================================================================
// Shared Encoders
// =============================================================================

/// Decode binary data to a JSON string: UTF-8 text when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Encode a float, falling back to a string for NaN and infinities.
pub fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Make result column names unique so every column keeps its own row key.
///
/// The first occurrence keeps its name; later duplicates become `name_1`,
/// `name_2`, ... skipping any name the result already uses.
pub fn unique_column_names(names: Vec<String>) -> Vec<String> {
    let reserved: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());

    names
        .iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name.clone();
            }
            let mut n = 1;
            loop {
                let candidate = format!("{}_{}", name, n);
                if !reserved.contains(candidate.as_str()) && used.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

// =============================================================================
// SQLite Rows
// =============================================================================

pub mod sqlite {
    use super::*;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Column, Row as _, TypeInfo, ValueRef};

    /// Column names of a row in engine order, made unique.
    pub fn column_names(row: &SqliteRow) -> Vec<String> {
        unique_column_names(row.columns().iter().map(|c| c.name().to_string()).collect())
    }

    /// Convert a row to a JSON map keyed positionally by `columns`.
    pub fn row_to_json(row: &SqliteRow, columns: &[String]) -> Row {
        columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), decode_column(row, idx)))
            .collect()
    }

    fn decode_column(row: &SqliteRow, idx: usize) -> JsonValue {
        let class = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => StorageClass::Null,
            Ok(raw) => storage_class(raw.type_info().name()),
            Err(_) => return JsonValue::Null,
        };

        match class {
            StorageClass::Null => JsonValue::Null,
            StorageClass::Integer => decode_integer(row, idx),
            StorageClass::Real => decode_real(row, idx),
            StorageClass::Blob => decode_blob(row, idx),
            StorageClass::Text => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::Number(v.into()))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_real(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(float_value)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_blob(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| decode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}

// =============================================================================
// DuckDB Values
// =============================================================================

pub mod duckdb {
    use super::*;
    use ::duckdb::types::{TimeUnit, Value};

    /// Convert a DuckDB value to JSON.
    pub fn value_to_json(value: Value) -> JsonValue {
        match value {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(b),
            Value::TinyInt(v) => v.into(),
            Value::SmallInt(v) => v.into(),
            Value::Int(v) => v.into(),
            Value::BigInt(v) => v.into(),
            Value::HugeInt(v) => float_value(v as f64),
            Value::UTinyInt(v) => v.into(),
            Value::USmallInt(v) => v.into(),
            Value::UInt(v) => v.into(),
            Value::UBigInt(v) => v.into(),
            Value::Float(v) => float_value(v as f64),
            Value::Double(v) => float_value(v),
            Value::Decimal(d) => {
                let text = d.to_string();
                text.parse::<f64>()
                    .map(float_value)
                    .unwrap_or(JsonValue::String(text))
            }
            Value::Timestamp(unit, v) => timestamp_value(to_micros(unit, v)),
            Value::Date32(days) => date_value(days),
            Value::Time64(unit, v) => time_value(to_micros(unit, v)),
            Value::Text(s) => JsonValue::String(s),
            Value::Enum(s) => JsonValue::String(s),
            Value::Blob(bytes) => decode_binary_value(&bytes),
            Value::List(items) => JsonValue::Array(items.into_iter().map(value_to_json).collect()),
            other => JsonValue::String(format!("{:?}", other)),
        }
    }

    fn to_micros(unit: TimeUnit, v: i64) -> i64 {
        match unit {
            TimeUnit::Second => v.saturating_mul(1_000_000),
            TimeUnit::Millisecond => v.saturating_mul(1_000),
            TimeUnit::Microsecond => v,
            TimeUnit::Nanosecond => v / 1_000,
        }
    }

    pub(super) fn timestamp_value(micros: i64) -> JsonValue {
        DateTime::from_timestamp_micros(micros)
            .map(|dt| JsonValue::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or_else(|| micros.into())
    }

    pub(super) fn date_value(days: i32) -> JsonValue {
        NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(TimeDelta::days(days as i64)))
            .map(|d| JsonValue::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| days.into())
    }

    pub(super) fn time_value(micros: i64) -> JsonValue {
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        u32::try_from(secs)
            .ok()
            .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, nanos))
            .map(|t| JsonValue::String(t.format("%H:%M:%S%.f").to_string()))
            .unwrap_or_else(|| micros.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::duckdb::types::{TimeUnit, Value};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unique_column_names() {
        assert_eq!(unique_column_names(names(&["a", "b"])), names(&["a", "b"]));
        assert_eq!(unique_column_names(names(&["a", "a", "a"])), names(&["a", "a_1", "a_2"]));
        // An existing `a_1` is never shadowed.
        assert_eq!(unique_column_names(names(&["a", "a", "a_1"])), names(&["a", "a_2", "a_1"]));
    }

    #[test]
    fn test_storage_class_runtime_names() {
        assert_eq!(storage_class("INTEGER"), StorageClass::Integer);
        assert_eq!(storage_class("REAL"), StorageClass::Real);
        assert_eq!(storage_class("TEXT"), StorageClass::Text);
        assert_eq!(storage_class("BLOB"), StorageClass::Blob);
        assert_eq!(storage_class("NULL"), StorageClass::Null);
    }

    #[test]
    fn test_storage_class_declared_types() {
        assert_eq!(storage_class("bigint"), StorageClass::Integer);
        assert_eq!(storage_class("VARCHAR(30)"), StorageClass::Text);
        assert_eq!(storage_class("double precision"), StorageClass::Real);
        assert_eq!(storage_class("DATETIME"), StorageClass::Text);
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(decode_binary_value(b"hello"), JsonValue::String("hello".into()));
        assert_eq!(
            decode_binary_value(&[0xff, 0xfe]),
            JsonValue::String("//4=".into())
        );
    }

    #[test]
    fn test_float_value_non_finite() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), JsonValue::String("NaN".into()));
    }

    #[test]
    fn test_duckdb_integers() {
        assert_eq!(duckdb::value_to_json(Value::Int(7)), serde_json::json!(7));
        assert_eq!(duckdb::value_to_json(Value::UBigInt(u64::MAX)), serde_json::json!(u64::MAX));
        assert_eq!(duckdb::value_to_json(Value::Null), JsonValue::Null);
    }

    #[test]
    fn test_duckdb_hugeint_is_narrowed() {
        let big: i128 = (1_i128 << 60) + 1;
        let json = duckdb::value_to_json(Value::HugeInt(big));
        assert_eq!(json.as_f64(), Some(big as f64));
        assert!(json.as_i64().is_none());
    }

    #[test]
    fn test_duckdb_temporal_values() {
        assert_eq!(duckdb::value_to_json(Value::Date32(19723)), serde_json::json!("2024-01-01"));
        assert_eq!(
            duckdb::value_to_json(Value::Timestamp(TimeUnit::Second, 1_704_067_200)),
            serde_json::json!("2024-01-01T00:00:00")
        );
        assert_eq!(
            duckdb::value_to_json(Value::Time64(TimeUnit::Microsecond, 3_600_000_000)),
            serde_json::json!("01:00:00")
        );
    }

    #[test]
    fn test_duckdb_text_and_list() {
        assert_eq!(duckdb::value_to_json(Value::Text("a".into())), serde_json::json!("a"));
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(duckdb::value_to_json(list), serde_json::json!([1, 2]));
    }
}
