//! Chart-spec rendering.
//!
//! The `create_visualization` tool hands us a chart spec; we compute the
//! plotted data here and write a self-contained JSON chart document the
//! front end can draw without touching the dataset again. Files are named
//! `viz_{n}.json` with a per-session counter and served under `/viz/`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use polars::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value as Json};
use tracing::info;

use crate::records::any_value_to_json;
use crate::stats::{column_f64s, column_stats, correlation_matrix, is_numeric_dtype};

#[derive(Debug, thiserror::Error)]
pub enum VizError {
    #[error("Unsupported visualization type: {0}")]
    Unsupported(String),

    #[error("Scatter plot requires both x and y columns")]
    ScatterNeedsY,

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("No numeric columns found")]
    NoNumericColumns,

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Histogram,
    Box,
    Pie,
    Heatmap,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Pie => "pie",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

impl FromStr for ChartKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "scatter" => Ok(ChartKind::Scatter),
            "histogram" => Ok(ChartKind::Histogram),
            "box" => Ok(ChartKind::Box),
            "pie" => Ok(ChartKind::Pie),
            "heatmap" => Ok(ChartKind::Heatmap),
            other => Err(VizError::Unsupported(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ChartKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
    Count,
    Min,
    Max,
    Median,
}

/// Tool-call arguments for `create_visualization`, as the model sends them.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "viz_type")]
    pub kind: ChartKind,
    pub x_column: String,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub color_column: Option<String>,
    #[serde(default)]
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

pub trait ChartRenderer: Send + Sync {
    fn render(
        &self,
        df: &DataFrame,
        spec: &ChartSpec,
        sequence: u32,
    ) -> Result<RenderedChart, VizError>;
}

/// Writes chart documents as JSON files under a directory.
pub struct ChartFileRenderer {
    dir: PathBuf,
}

impl ChartFileRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChartRenderer for ChartFileRenderer {
    fn render(
        &self,
        df: &DataFrame,
        spec: &ChartSpec,
        sequence: u32,
    ) -> Result<RenderedChart, VizError> {
        let data = chart_data(df, spec)?;
        let document = json!({
            "viz_type": spec.kind.as_str(),
            "title": spec.title.clone().unwrap_or_else(|| default_title(spec)),
            "x_column": spec.x_column,
            "y_column": spec.y_column,
            "color_column": spec.color_column,
            "data": data,
        });

        fs::create_dir_all(&self.dir)?;
        let filename = format!("viz_{sequence}.json");
        let path = self.dir.join(&filename);
        fs::write(&path, serde_json::to_vec_pretty(&document)?)?;
        info!(chart = spec.kind.as_str(), file = %path.display(), "chart written");

        Ok(RenderedChart {
            url: format!("/viz/{filename}"),
            filename,
            path,
        })
    }
}

fn default_title(spec: &ChartSpec) -> String {
    match &spec.y_column {
        Some(y) => format!("{} by {}", y, spec.x_column),
        None => spec.x_column.clone(),
    }
}

fn chart_data(df: &DataFrame, spec: &ChartSpec) -> Result<Json, VizError> {
    require_column(df, &spec.x_column)?;
    if let Some(y) = &spec.y_column {
        require_column(df, y)?;
    }
    if let Some(c) = &spec.color_column {
        require_column(df, c)?;
    }

    match spec.kind {
        ChartKind::Bar | ChartKind::Pie => {
            let (labels, values) = match &spec.y_column {
                Some(y) => grouped_pairs(df, &spec.x_column, y, spec.aggregation)?,
                None => value_count_pairs(df, &spec.x_column)?,
            };
            Ok(json!({"labels": labels, "values": values}))
        }
        ChartKind::Line => match spec.y_column.as_deref() {
            Some(y) => Ok(json!({
                "x": column_json(df, &spec.x_column)?,
                "y": column_json(df, y)?,
            })),
            // No y column: plot the x column against its row index.
            None => Ok(json!({
                "x": (0..df.height()).collect::<Vec<_>>(),
                "y": column_json(df, &spec.x_column)?,
            })),
        },
        ChartKind::Scatter => {
            let y = spec.y_column.as_deref().ok_or(VizError::ScatterNeedsY)?;
            Ok(json!({
                "x": column_json(df, &spec.x_column)?,
                "y": column_json(df, y)?,
            }))
        }
        ChartKind::Histogram => histogram_data(df, &spec.x_column),
        ChartKind::Box => box_data(df, spec),
        ChartKind::Heatmap => heatmap_data(df),
    }
}

fn require_column(df: &DataFrame, name: &str) -> Result<(), VizError> {
    df.column(name)
        .map(|_| ())
        .map_err(|_| VizError::ColumnNotFound(name.to_string()))
}

fn column_json(df: &DataFrame, name: &str) -> Result<Vec<Json>, VizError> {
    let series = df
        .column(name)
        .map_err(|_| VizError::ColumnNotFound(name.to_string()))?
        .as_materialized_series();
    Ok((0..series.len())
        .map(|i| any_value_to_json(&series.get(i).unwrap_or(AnyValue::Null)))
        .collect())
}

/// Aggregates `y` per distinct value of `x`, sorted by `x` for stable output.
fn grouped_pairs(
    df: &DataFrame,
    x: &str,
    y: &str,
    aggregation: Aggregation,
) -> Result<(Vec<Json>, Vec<Json>), VizError> {
    let agg_expr = match aggregation {
        Aggregation::Sum => col(y).sum(),
        Aggregation::Mean => col(y).mean(),
        Aggregation::Count => col(y).count(),
        Aggregation::Min => col(y).min(),
        Aggregation::Max => col(y).max(),
        Aggregation::Median => col(y).median(),
    };
    let out = df
        .clone()
        .lazy()
        .group_by([col(x)])
        .agg([agg_expr.alias("value")])
        .sort(
            vec![PlSmallStr::from(x)],
            SortMultipleOptions::default(),
        )
        .collect()?;
    Ok((column_json(&out, x)?, column_json(&out, "value")?))
}

/// Occurrence counts per distinct value of `x`, most frequent first.
fn value_count_pairs(df: &DataFrame, x: &str) -> Result<(Vec<Json>, Vec<Json>), VizError> {
    let out = df
        .clone()
        .lazy()
        .group_by([col(x)])
        .agg([len().alias("value")])
        .sort(
            vec![PlSmallStr::from_static("value")],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .collect()?;
    Ok((column_json(&out, x)?, column_json(&out, "value")?))
}

const HISTOGRAM_BINS: usize = 30;

fn histogram_data(df: &DataFrame, x: &str) -> Result<Json, VizError> {
    let column = df
        .column(x)
        .map_err(|_| VizError::ColumnNotFound(x.to_string()))?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(VizError::NoNumericColumns);
    }
    let values: Vec<f64> = column_f64s(column.as_materialized_series())
        .into_iter()
        .flatten()
        .collect();
    if values.is_empty() {
        return Ok(json!({"edges": [], "counts": []}));
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(json!({"edges": [min, max], "counts": [values.len()]}));
    }

    let width = (max - min) / HISTOGRAM_BINS as f64;
    let mut counts = vec![0usize; HISTOGRAM_BINS];
    for v in &values {
        let mut bin = ((v - min) / width) as usize;
        if bin >= HISTOGRAM_BINS {
            bin = HISTOGRAM_BINS - 1;
        }
        counts[bin] += 1;
    }
    let edges: Vec<f64> = (0..=HISTOGRAM_BINS)
        .map(|i| min + width * i as f64)
        .collect();
    Ok(json!({"edges": edges, "counts": counts}))
}

/// Five-number summaries: one box per distinct `x` value when `y` is given,
/// otherwise a single box over `x` itself.
fn box_data(df: &DataFrame, spec: &ChartSpec) -> Result<Json, VizError> {
    let boxes = match &spec.y_column {
        Some(y) => {
            let mut boxes = Vec::new();
            let labels = df
                .clone()
                .lazy()
                .select([col(spec.x_column.as_str()).unique_stable()])
                .collect()?;
            let labels = column_json(&labels, &spec.x_column)?;
            for label in labels {
                let label_str = match &label {
                    Json::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let mask = df
                    .column(&spec.x_column)?
                    .as_materialized_series()
                    .iter()
                    .map(|av| Some(any_value_to_json(&av) == label))
                    .collect::<BooleanChunked>();
                let subset = df.filter(&mask)?;
                let series = subset.column(y)?.as_materialized_series().clone();
                boxes.push(box_entry(&label_str, &series));
            }
            boxes
        }
        None => {
            let series = df.column(&spec.x_column)?.as_materialized_series().clone();
            vec![box_entry(&spec.x_column, &series)]
        }
    };
    Ok(json!({"boxes": boxes}))
}

fn box_entry(label: &str, series: &Series) -> Json {
    let stats = column_stats(series);
    json!({
        "label": label,
        "min": stats.min,
        "q1": stats.q1,
        "median": stats.median,
        "q3": stats.q3,
        "max": stats.max,
    })
}

fn heatmap_data(df: &DataFrame) -> Result<Json, VizError> {
    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();
    if numeric.is_empty() {
        return Err(VizError::NoNumericColumns);
    }
    let matrix = correlation_matrix(df, &numeric);
    Ok(json!({"columns": numeric, "matrix": matrix}))
}
