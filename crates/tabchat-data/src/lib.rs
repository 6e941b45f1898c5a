//! Tabular data engine for tabchat.
//!
//! Owns the uploaded dataset (`DatasetHandle`), the restricted analysis
//! evaluator (`sandbox`), and the chart-spec renderer (`viz`). Everything a
//! tool call can touch lives behind this crate; the AI layer only sees
//! JSON-safe values coming back out.

pub mod dataset;
pub mod records;
pub mod sandbox;
pub mod stats;
pub mod viz;

pub use dataset::{DataError, DatasetHandle};
pub use viz::{
    Aggregation, ChartFileRenderer, ChartKind, ChartRenderer, ChartSpec, RenderedChart, VizError,
};

impl From<DataError> for tabchat_common::TabchatError {
    fn from(err: DataError) -> Self {
        tabchat_common::TabchatError::Data(err.to_string())
    }
}
