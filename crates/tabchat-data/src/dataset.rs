//! Dataset handle: the in-memory owner of one uploaded table.
//!
//! Every tool call in a session runs against the same handle. Metadata and
//! statistics queries are read-only; the sandbox receives a clone of the
//! frame so failed snippets can never corrupt session state.

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::records::rows_to_records;
use crate::stats::{column_stats, correlation_matrix, is_numeric_dtype};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Error reading CSV: {0}")]
    Csv(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("No numeric columns found")]
    NoNumericColumns,

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub struct DatasetHandle {
    df: DataFrame,
}

impl DatasetHandle {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DataError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| DataError::Csv(e.to_string()))?
            .finish()
            .map_err(|e| DataError::Csv(e.to_string()))?;
        debug!(rows = df.height(), columns = df.width(), "loaded CSV");
        Ok(Self { df })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DataError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10_000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| DataError::Csv(e.to_string()))?;
        debug!(rows = df.height(), columns = df.width(), "loaded CSV");
        Ok(Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    /// Shape, column names, per-column dtype and missing-value counts, and
    /// an approximate memory footprint.
    pub fn info(&self) -> Value {
        let names = self.column_names();

        let mut dtypes = Map::new();
        let mut missing = Map::new();
        let mut total_missing: usize = 0;
        for (column, name) in self.df.get_columns().iter().zip(&names) {
            dtypes.insert(name.clone(), Value::from(column.dtype().to_string()));
            let nulls = column.null_count();
            total_missing += nulls;
            missing.insert(name.clone(), Value::from(nulls));
        }

        json!({
            "shape": {
                "rows": self.df.height(),
                "columns": self.df.width(),
            },
            "columns": names,
            "dtypes": Value::Object(dtypes),
            "missing_values": Value::Object(missing),
            "total_missing": total_missing,
            "memory_usage_mb": (self.df.estimated_size() as f64) / (1024.0 * 1024.0),
        })
    }

    /// Describe-style statistics for the numeric columns, with pairwise
    /// correlations (only when two or more numeric columns resolve),
    /// skewness and kurtosis.
    ///
    /// An explicit subset that resolves to zero numeric columns — or a
    /// dataset with none at all — is an error, so callers can tell "nothing
    /// to summarize" apart from a trivially small summary.
    pub fn statistical_summary(&self, columns: Option<&[String]>) -> Result<Value, DataError> {
        let selected: Vec<String> = match columns {
            Some(requested) => {
                let mut numeric = Vec::new();
                for name in requested {
                    let column = self
                        .df
                        .column(name)
                        .map_err(|_| DataError::ColumnNotFound(name.clone()))?;
                    if is_numeric_dtype(column.dtype()) {
                        numeric.push(name.clone());
                    }
                }
                numeric
            }
            None => self
                .df
                .get_columns()
                .iter()
                .filter(|c| is_numeric_dtype(c.dtype()))
                .map(|c| c.name().to_string())
                .collect(),
        };

        if selected.is_empty() {
            return Err(DataError::NoNumericColumns);
        }

        let mut describe = Map::new();
        let mut skewness = Map::new();
        let mut kurtosis = Map::new();
        for name in &selected {
            let series = self.df.column(name)?.as_materialized_series();
            let stats = column_stats(series);
            describe.insert(
                name.clone(),
                json!({
                    "count": stats.count,
                    "mean": stats.mean,
                    "std": stats.std,
                    "min": stats.min,
                    "25%": stats.q1,
                    "50%": stats.median,
                    "75%": stats.q3,
                    "max": stats.max,
                }),
            );
            skewness.insert(name.clone(), json!(stats.skewness));
            kurtosis.insert(name.clone(), json!(stats.kurtosis));
        }

        let correlations = if selected.len() > 1 {
            let matrix = correlation_matrix(&self.df, &selected);
            let mut outer = Map::new();
            for (i, a) in selected.iter().enumerate() {
                let mut inner = Map::new();
                for (j, b) in selected.iter().enumerate() {
                    inner.insert(b.clone(), json!(matrix[i][j]));
                }
                outer.insert(a.clone(), Value::Object(inner));
            }
            Value::Object(outer)
        } else {
            Value::Object(Map::new())
        };

        Ok(json!({
            "describe": Value::Object(describe),
            "correlations": correlations,
            "skewness": Value::Object(skewness),
            "kurtosis": Value::Object(kurtosis),
        }))
    }

    /// Bounded preview for the upload response: first `limit` rows, missing
    /// values normalized to JSON `null`.
    pub fn preview(&self, limit: usize) -> Value {
        json!({
            "columns": self.column_names(),
            "rows": rows_to_records(&self.df, limit),
        })
    }
}
