//! Integration tests for result transformation.

use datafile_mcp_server::error::DataError;
use datafile_mcp_server::models::{ColumnMapping, QueryResult, Row, SeriesData, TransformMode};
use datafile_mcp_server::tools::transform::{
    Transformed, coerce_numeric, extract_labels, to_series, to_table, transform,
};
use serde_json::json;

fn rows(value: serde_json::Value) -> Vec<Row> {
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
fn test_empty_table_keeps_headers() {
    let table = to_table(&[], &cols(&["a", "b"]));
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json, json!({"headers": ["a", "b"], "rows": []}));
}

#[test]
fn test_table_rows_follow_column_order() {
    let data = rows(json!([{"b": "x", "a": 1}, {"a": 2, "b": null}]));
    let table = to_table(&data, &cols(&["a", "b"]));
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["rows"], json!([[1, "x"], [2, null]]));
}

#[test]
fn test_one_series_per_y_column() {
    let data = rows(json!([{"x": 2, "y1": 5, "y2": 1}, {"x": 1, "y1": 3, "y2": 9}]));
    let mapping = ColumnMapping::new("x", ["y1", "y2"]);
    let series = to_series(&data, &cols(&["x", "y1", "y2"]), &mapping).unwrap();

    assert_eq!(
        series,
        vec![
            SeriesData::new("y1", vec![[1.0, 3.0], [2.0, 5.0]]),
            SeriesData::new("y2", vec![[1.0, 9.0], [2.0, 1.0]]),
        ]
    );
}

#[test]
fn test_series_column_last_write_wins() {
    let data = rows(json!([
        {"cat": "a", "x": 1, "y": 1},
        {"cat": "a", "x": 1, "y": 2},
        {"cat": "a", "x": 2, "y": 3},
        {"cat": "b", "x": 1, "y": 4},
        {"cat": "a", "x": 1, "y": 5},
    ]));
    let mapping = ColumnMapping::new("x", ["y"]).with_series_column("cat");
    let series = to_series(&data, &cols(&["cat", "x", "y"]), &mapping).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].name, "a");
    assert_eq!(series[0].data, vec![[1.0, 5.0], [2.0, 3.0]]);
    assert_eq!(series[1].name, "b");
    assert_eq!(series[1].data, vec![[1.0, 4.0]]);
}

#[test]
fn test_series_column_wins_over_group_by() {
    let data = rows(json!([
        {"s": "one", "g": "left", "x": 1, "y": 1},
        {"s": "two", "g": "left", "x": 1, "y": 2},
    ]));
    let mapping = ColumnMapping::new("x", ["y"])
        .with_group_by_column("g")
        .with_series_column("s");
    let series = to_series(&data, &cols(&["s", "g", "x", "y"]), &mapping).unwrap();
    let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["one", "two"]);
}

#[test]
fn test_date_strings_as_x() {
    let data = rows(json!([
        {"day": "2024-01-02", "v": 2},
        {"day": "2024-01-01", "v": "1.5"},
    ]));
    let mapping = ColumnMapping::new("day", ["v"]);
    let series = to_series(&data, &cols(&["day", "v"]), &mapping).unwrap();
    assert_eq!(
        series[0].data,
        vec![[1_704_067_200_000.0, 1.5], [1_704_153_600_000.0, 2.0]]
    );
}

#[test]
fn test_coercion_properties() {
    assert_eq!(coerce_numeric(Some(&json!("3.14"))).unwrap(), 3.14);
    assert_eq!(coerce_numeric(Some(&json!("2024-01-01"))).unwrap(), 1_704_067_200_000.0);

    let err = coerce_numeric(Some(&json!("abc"))).unwrap_err();
    assert!(matches!(err, DataError::ValueCoercion { ref value } if value == "abc"));
}

#[test]
fn test_uncoercible_cell_fails_whole_transform() {
    let data = rows(json!([{"x": 1, "y": 1}, {"x": 2, "y": "n/a"}]));
    let mapping = ColumnMapping::new("x", ["y"]);
    let err = to_series(&data, &cols(&["x", "y"]), &mapping).unwrap_err();
    assert!(err.to_string().contains("n/a"));
}

#[test]
fn test_missing_x_column_both_ways() {
    let columns = cols(&["x", "y"]);

    let absent = ColumnMapping {
        y_columns: Some(vec!["y".into()]),
        ..Default::default()
    };
    assert!(matches!(
        to_series(&[], &columns, &absent),
        Err(DataError::MissingColumn { .. })
    ));

    let unknown = ColumnMapping::new("when", ["y"]);
    assert!(matches!(
        to_series(&[], &columns, &unknown),
        Err(DataError::MissingColumn { .. })
    ));
}

#[test]
fn test_missing_y_column() {
    let mapping = ColumnMapping::new("x", ["y", "z"]);
    let err = to_series(&[], &cols(&["x", "y"]), &mapping).unwrap_err();
    assert!(err.to_string().contains("yColumn 'z'"));
}

#[test]
fn test_labels_in_row_order() {
    let data = rows(json!([{"m": "Feb"}, {"m": "Jan"}, {"m": 7}]));
    assert_eq!(extract_labels(&data, "m"), vec!["Feb", "Jan", "7"]);
}

#[test]
fn test_transform_series_serializes_as_pairs() {
    let result = QueryResult::new(cols(&["x", "y"]), rows(json!([{"x": 1, "y": 2}])));
    let mapping = ColumnMapping::new("x", ["y"]);
    let out = transform(&result, TransformMode::Series, Some(&mapping)).unwrap();

    assert!(matches!(out, Transformed::Series(_)));
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json, json!({"series": [{"name": "y", "data": [[1.0, 2.0]]}]}));
}
