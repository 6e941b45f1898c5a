//! Conversion from polars values to JSON payloads.
//!
//! Tool results cross the model boundary as plain JSON, so every `AnyValue`
//! has to collapse into a JSON-native type here. Non-finite floats become
//! `null` (JSON has no NaN), and anything without a natural JSON shape is
//! stringified.

use polars::prelude::*;
use serde_json::{Map, Value};

pub fn any_value_to_json(av: &AnyValue) -> Value {
    match av {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::from(*b),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => {
            if v.is_finite() {
                Value::from(f64::from(*v))
            } else {
                Value::Null
            }
        }
        AnyValue::Float64(v) => {
            if v.is_finite() {
                Value::from(*v)
            } else {
                Value::Null
            }
        }
        AnyValue::String(s) => Value::from(*s),
        AnyValue::StringOwned(s) => Value::from(s.as_str()),
        other => Value::from(other.to_string()),
    }
}

/// First `limit` rows as a list of `{column: value}` records.
pub fn rows_to_records(df: &DataFrame, limit: usize) -> Vec<Value> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let take = df.height().min(limit);
    (0..take)
        .map(|i| {
            let mut record = Map::new();
            for (column, name) in df.get_columns().iter().zip(&names) {
                let av = column
                    .as_materialized_series()
                    .get(i)
                    .unwrap_or(AnyValue::Null);
                record.insert(name.clone(), any_value_to_json(&av));
            }
            Value::Object(record)
        })
        .collect()
}

/// First `limit` entries of a series as `{row position: value}`.
///
/// Keys are stringified positions ("0", "1", ...) — the shape the original
/// JSON round-trip produced from integer-indexed series.
pub fn series_entries(s: &Series, limit: usize) -> Map<String, Value> {
    let take = s.len().min(limit);
    let mut entries = Map::new();
    for i in 0..take {
        let av = s.get(i).unwrap_or(AnyValue::Null);
        entries.insert(i.to_string(), any_value_to_json(&av));
    }
    entries
}
