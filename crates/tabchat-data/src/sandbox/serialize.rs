//! JSON serialization of evaluator results.
//!
//! Every result carries a `type` tag so the model can tell a truncated
//! dataframe preview from a scalar answer. Frames and series are capped at
//! ten entries; the `shape` field always reports the true size.
//!
//! Grouped aggregations materialize as a two-column frame (group key plus
//! aggregate), so `df.groupby('g')['a'].sum()` serializes with the
//! `dataframe` tag and an explicit key column rather than as a label-keyed
//! series. The group labels are still in the payload, just as records.

use serde_json::{json, Value as Json};

use super::eval::{ScalarValue, Value};
use crate::records::{rows_to_records, series_entries};

const PREVIEW_ROWS: usize = 10;

pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Frame(df) => json!({
            "type": "dataframe",
            "data": rows_to_records(df, PREVIEW_ROWS),
            "shape": [df.height(), df.width()],
        }),
        Value::Series(s) => json!({
            "type": "series",
            "data": Json::Object(series_entries(s, PREVIEW_ROWS)),
        }),
        Value::Scalar(s) => json!({
            "type": "scalar",
            "value": scalar_to_json(s),
        }),
        Value::List(items) => json!({
            "type": "collection",
            "value": items.iter().map(scalar_to_json).collect::<Vec<_>>(),
        }),
        Value::Grouped { keys, .. } | Value::GroupedColumn { keys, .. } => json!({
            "type": "other",
            "value": format!("grouped by [{}]; apply an aggregation to materialize", keys.join(", ")),
        }),
    }
}

fn scalar_to_json(s: &ScalarValue) -> Json {
    match s {
        ScalarValue::Int(v) => Json::from(*v),
        ScalarValue::Float(v) => {
            if v.is_finite() {
                Json::from(*v)
            } else {
                Json::Null
            }
        }
        ScalarValue::Str(v) => Json::from(v.as_str()),
        ScalarValue::Bool(v) => Json::from(*v),
        ScalarValue::Null => Json::Null,
    }
}
