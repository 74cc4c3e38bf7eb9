//! Result transformation into chart-ready shapes.
//!
//! Query rows become either a positional [`TableData`] or a list of [`SeriesData`].
//! Series x/y values go through [`coerce_numeric`]: JSON numbers are used as-is,
//! strings are tried as a float first and as a date/time second (epoch
//! milliseconds, UTC). Anything else is a coercion error.

use crate::error::{DataError, DataResult};
use crate::models::{
    ColumnMapping, QueryResult, Row, SeriesData, TableCell, TableData, TransformMode,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Output of [`transform`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transformed {
    Table(TableData),
    Series(Vec<SeriesData>),
}

/// Transform a query result into the requested shape.
///
/// `mapping` is ignored in table mode and required in series mode.
pub fn transform(
    result: &QueryResult,
    mode: TransformMode,
    mapping: Option<&ColumnMapping>,
) -> DataResult<Transformed> {
    match mode {
        TransformMode::Table => Ok(Transformed::Table(to_table(&result.rows, &result.columns))),
        TransformMode::Series => {
            let mapping = mapping.ok_or_else(|| {
                DataError::missing_column("xColumn is required for chart transformation")
            })?;
            to_series(&result.rows, &result.columns, mapping).map(Transformed::Series)
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Reshape rows positionally in column order.
pub fn to_table(rows: &[Row], columns: &[String]) -> TableData {
    TableData {
        headers: columns.to_vec(),
        rows: rows
            .iter()
            .map(|row| columns.iter().map(|c| to_cell(row.get(c))).collect())
            .collect(),
    }
}

fn to_cell(value: Option<&JsonValue>) -> TableCell {
    match value {
        None | Some(JsonValue::Null) => TableCell::Null,
        Some(JsonValue::Number(n)) => TableCell::Number(n.clone()),
        Some(JsonValue::String(s)) => TableCell::Text(s.clone()),
        Some(JsonValue::Bool(b)) => TableCell::Text(b.to_string()),
        Some(other) => TableCell::Text(other.to_string()),
    }
}

// =============================================================================
// Series
// =============================================================================

/// Project rows into named (x, y) series.
///
/// With a series (or group-by) column, rows are partitioned by that column's value
/// and only the first y column is used; a repeated x within a group keeps the last
/// y seen. Without one, each y column becomes its own series.
pub fn to_series(
    rows: &[Row],
    columns: &[String],
    mapping: &ColumnMapping,
) -> DataResult<Vec<SeriesData>> {
    let (x_column, y_columns) = validate_mapping(columns, mapping)?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    match mapping.grouping_column() {
        Some(group_column) => grouped_series(rows, x_column, &y_columns[0], group_column),
        None => y_columns
            .iter()
            .map(|y| single_series(rows, x_column, y))
            .collect(),
    }
}

fn validate_mapping<'a>(
    columns: &[String],
    mapping: &'a ColumnMapping,
) -> DataResult<(&'a str, &'a [String])> {
    let x_column = mapping
        .x_column
        .as_deref()
        .filter(|x| !x.is_empty())
        .ok_or_else(|| DataError::missing_column("xColumn is required for chart transformation"))?;

    let y_columns = mapping
        .y_columns
        .as_deref()
        .filter(|ys| !ys.is_empty())
        .ok_or_else(|| {
            DataError::missing_column("at least one yColumn is required for chart transformation")
        })?;

    let require = |role: &str, name: &str| -> DataResult<()> {
        if columns.iter().any(|c| c == name) {
            Ok(())
        } else {
            Err(DataError::missing_column(format!(
                "{} '{}' not found in query results",
                role, name
            )))
        }
    };

    require("xColumn", x_column)?;
    for y in y_columns {
        require("yColumn", y)?;
    }
    if let Some(series) = &mapping.series_column {
        require("seriesColumn", series)?;
    }
    if let Some(group) = &mapping.group_by_column {
        require("groupByColumn", group)?;
    }

    Ok((x_column, y_columns))
}

fn grouped_series(
    rows: &[Row],
    x_column: &str,
    y_column: &str,
    group_column: &str,
) -> DataResult<Vec<SeriesData>> {
    // Group order is first appearance; x keys are bit patterns so equal floats collide.
    let mut groups: IndexMap<String, IndexMap<u64, [f64; 2]>> = IndexMap::new();

    for row in rows {
        let name = label(row.get(group_column));
        let x = normalize_zero(coerce_numeric(row.get(x_column))?);
        let y = coerce_numeric(row.get(y_column))?;

        groups.entry(name).or_default().insert(x.to_bits(), [x, y]);
    }

    Ok(groups
        .into_iter()
        .map(|(name, points)| {
            let mut data: Vec<[f64; 2]> = points.into_values().collect();
            data.sort_by(|a, b| a[0].total_cmp(&b[0]));
            SeriesData::new(name, data)
        })
        .collect())
}

fn single_series(rows: &[Row], x_column: &str, y_column: &str) -> DataResult<SeriesData> {
    let mut data = rows
        .iter()
        .map(|row| {
            Ok([
                coerce_numeric(row.get(x_column))?,
                coerce_numeric(row.get(y_column))?,
            ])
        })
        .collect::<DataResult<Vec<[f64; 2]>>>()?;

    data.sort_by(|a, b| a[0].total_cmp(&b[0]));
    Ok(SeriesData::new(y_column, data))
}

fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

// =============================================================================
// Coercion
// =============================================================================

/// Naive date-time layouts tried after RFC 3339 / RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Coerce a cell to a number.
///
/// # Examples
///
/// ```
/// use datafile_mcp_server::tools::transform::coerce_numeric;
/// use serde_json::json;
///
/// assert_eq!(coerce_numeric(Some(&json!("3.14"))).unwrap(), 3.14);
/// assert_eq!(coerce_numeric(Some(&json!("2024-01-01"))).unwrap(), 1_704_067_200_000.0);
/// assert!(coerce_numeric(Some(&json!("abc"))).is_err());
/// ```
pub fn coerce_numeric(value: Option<&JsonValue>) -> DataResult<f64> {
    match value {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| DataError::value_coercion(n.to_string())),
        Some(JsonValue::String(s)) => parse_float(s)
            .or_else(|| parse_epoch_millis(s))
            .ok_or_else(|| DataError::value_coercion(s.clone())),
        Some(other) => Err(DataError::value_coercion(other.to_string())),
        None => Err(DataError::value_coercion("null")),
    }
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date or date-time string to milliseconds since the Unix epoch.
pub fn parse_epoch_millis(s: &str) -> Option<f64> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis() as f64);
        }
    }
    None
}

// =============================================================================
// Labels
// =============================================================================

/// String form of each row's x value, in row order.
pub fn extract_labels(rows: &[Row], x_column: &str) -> Vec<String> {
    rows.iter().map(|row| label(row.get(x_column))).collect()
}

fn label(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => "null".to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            // f64 Display drops a zero fraction ("3", not "3.0").
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: JsonValue) -> Vec<Row> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_to_table_empty() {
        let table = to_table(&[], &cols(&["a", "b"]));
        assert_eq!(table.headers, cols(&["a", "b"]));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_to_table_positional() {
        let data = rows(json!([{"b": 2, "a": "x"}, {"a": null, "b": 1.5}]));
        let table = to_table(&data, &cols(&["a", "b"]));
        assert_eq!(
            table.rows,
            vec![
                vec![TableCell::Text("x".into()), TableCell::Number(2.into())],
                vec![TableCell::Null, TableCell::Number(serde_json::Number::from_f64(1.5).unwrap())],
            ]
        );
    }

    #[test]
    fn test_multi_y_series_sorted() {
        let data = rows(json!([{"x": 2, "y1": 5, "y2": 1}, {"x": 1, "y1": 3, "y2": 9}]));
        let mapping = ColumnMapping::new("x", ["y1", "y2"]);
        let series = to_series(&data, &cols(&["x", "y1", "y2"]), &mapping).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0], SeriesData::new("y1", vec![[1.0, 3.0], [2.0, 5.0]]));
        assert_eq!(series[1], SeriesData::new("y2", vec![[1.0, 9.0], [2.0, 1.0]]));
    }

    #[test]
    fn test_grouped_series_last_write_wins() {
        let data = rows(json!([
            {"cat": "b", "x": 1, "y": 10},
            {"cat": "a", "x": 2, "y": 20},
            {"cat": "b", "x": 1, "y": 11},
            {"cat": "a", "x": 1, "y": 5},
        ]));
        let mapping = ColumnMapping::new("x", ["y"]).with_series_column("cat");
        let series = to_series(&data, &cols(&["cat", "x", "y"]), &mapping).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0], SeriesData::new("b", vec![[1.0, 11.0]]));
        assert_eq!(series[1], SeriesData::new("a", vec![[1.0, 5.0], [2.0, 20.0]]));
    }

    #[test]
    fn test_group_by_uses_first_y_only() {
        let data = rows(json!([{"g": 1, "x": 0, "y1": 1, "y2": 2}]));
        let mapping = ColumnMapping::new("x", ["y1", "y2"]).with_group_by_column("g");
        let series = to_series(&data, &cols(&["g", "x", "y1", "y2"]), &mapping).unwrap();
        assert_eq!(series, vec![SeriesData::new("1", vec![[0.0, 1.0]])]);
    }

    #[test]
    fn test_negative_zero_collides_with_zero() {
        let data = rows(json!([{"g": "a", "x": -0.0, "y": 1}, {"g": "a", "x": 0, "y": 2}]));
        let mapping = ColumnMapping::new("x", ["y"]).with_series_column("g");
        let series = to_series(&data, &cols(&["g", "x", "y"]), &mapping).unwrap();
        assert_eq!(series[0].data, vec![[0.0, 2.0]]);
    }

    #[test]
    fn test_missing_x_column() {
        let mapping = ColumnMapping {
            y_columns: Some(vec!["y".into()]),
            ..Default::default()
        };
        let err = to_series(&[], &cols(&["x", "y"]), &mapping).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));

        let mapping = ColumnMapping::new("nope", ["y"]);
        let err = to_series(&[], &cols(&["x", "y"]), &mapping).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_missing_y_and_group_columns() {
        let columns = cols(&["x", "y"]);
        let empty_ys = ColumnMapping::new("x", Vec::<String>::new());
        assert!(matches!(
            to_series(&[], &columns, &empty_ys),
            Err(DataError::MissingColumn { .. })
        ));

        let bad_group = ColumnMapping::new("x", ["y"]).with_group_by_column("region");
        let err = to_series(&[], &columns, &bad_group).unwrap_err();
        assert!(err.to_string().contains("groupByColumn 'region'"));
    }

    #[test]
    fn test_empty_rows_after_validation() {
        let mapping = ColumnMapping::new("x", ["y"]);
        assert!(to_series(&[], &cols(&["x", "y"]), &mapping).unwrap().is_empty());
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(Some(&json!(42))).unwrap(), 42.0);
        assert_eq!(coerce_numeric(Some(&json!("3.14"))).unwrap(), 3.14);
        assert_eq!(coerce_numeric(Some(&json!("1e3"))).unwrap(), 1000.0);
        assert_eq!(
            coerce_numeric(Some(&json!("2024-01-01"))).unwrap(),
            1_704_067_200_000.0
        );
        assert_eq!(
            coerce_numeric(Some(&json!("2024-01-01T00:00:01Z"))).unwrap(),
            1_704_067_201_000.0
        );
        assert_eq!(
            coerce_numeric(Some(&json!("2024/01/02"))).unwrap(),
            1_704_153_600_000.0
        );
    }

    #[test]
    fn test_coerce_numeric_failures_name_value() {
        let err = coerce_numeric(Some(&json!("abc"))).unwrap_err();
        assert!(matches!(err, DataError::ValueCoercion { .. }));
        assert!(err.to_string().contains("abc"));

        assert!(coerce_numeric(Some(&json!("NaN"))).is_err());
        assert!(coerce_numeric(Some(&JsonValue::Null)).is_err());
        assert!(coerce_numeric(Some(&json!(true))).is_err());
        assert!(coerce_numeric(None).is_err());
    }

    #[test]
    fn test_extract_labels() {
        let data = rows(json!([{"x": "Jan"}, {"x": 3.0}, {"x": 2.5}, {"x": null}, {}]));
        assert_eq!(extract_labels(&data, "x"), vec!["Jan", "3", "2.5", "null", "null"]);
    }

    #[test]
    fn test_transform_dispatch() {
        let result = QueryResult::new(cols(&["x"]), rows(json!([{"x": 1}])));
        let table = transform(&result, TransformMode::Table, None).unwrap();
        assert!(matches!(table, Transformed::Table(_)));

        let err = transform(&result, TransformMode::Series, None).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }
}
