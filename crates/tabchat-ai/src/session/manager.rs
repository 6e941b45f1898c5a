//! Session struct and tool dispatch.

use serde_json::{json, Value};
use tracing::debug;

use tabchat_data::{sandbox, ChartRenderer, ChartSpec, DatasetHandle};

use crate::token_tracker::TokenTracker;
use crate::tools::analysis_tools;
use crate::{ToolCall, ToolDefinition};

use super::types::{StoredMessage, ToolName};

/// One conversation bound to one uploaded dataset.
pub struct Session {
    pub(super) dataset: DatasetHandle,
    pub(super) filename: String,
    pub(super) messages: Vec<StoredMessage>,
    pub(super) tools: Vec<ToolDefinition>,
    pub(super) tracker: TokenTracker,
    /// Maximum tool-call loop iterations per chat turn.
    pub(super) max_tool_rounds: u32,
    /// Counter for chart filenames, monotonic within the session.
    pub(super) viz_counter: u32,
}

impl Session {
    pub fn new(dataset: DatasetHandle, filename: impl Into<String>) -> Self {
        Self {
            dataset,
            filename: filename.into(),
            messages: Vec::new(),
            tools: analysis_tools(),
            tracker: TokenTracker::new(),
            max_tool_rounds: 10,
            viz_counter: 0,
        }
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    pub fn dataset(&self) -> &DatasetHandle {
        &self.dataset
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Get the full conversation history.
    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    /// Get the token tracker.
    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    /// Clear conversation history.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages in history.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Execute one tool call. Failures never escape as errors; they go back
    /// to the model as `{"error": ...}` payloads it can react to.
    pub(crate) fn execute_tool(
        &mut self,
        renderer: &dyn ChartRenderer,
        call: &ToolCall,
    ) -> Value {
        debug!(tool = %call.name, "executing tool");
        let Some(tool) = ToolName::parse(&call.name) else {
            return json!({ "error": format!("Unknown function: {}", call.name) });
        };

        match tool {
            ToolName::DataframeInfo => self.dataset.info(),
            ToolName::StatisticalSummary => {
                let columns = match summary_columns(&call.arguments) {
                    Ok(columns) => columns,
                    Err(message) => return json!({ "error": message }),
                };
                match self.dataset.statistical_summary(columns.as_deref()) {
                    Ok(summary) => summary,
                    Err(e) => json!({ "error": e.to_string() }),
                }
            }
            ToolName::PythonAnalysis => {
                let Some(code) = call.arguments["code"].as_str() else {
                    return json!({ "error": "python_analysis requires a 'code' argument" });
                };
                match sandbox::run(self.dataset.df(), code) {
                    Ok(result) => result,
                    Err(e) => json!({ "error": e.to_string() }),
                }
            }
            ToolName::CreateVisualization => {
                let spec: ChartSpec = match serde_json::from_value(call.arguments.clone()) {
                    Ok(spec) => spec,
                    Err(e) => return json!({ "error": e.to_string() }),
                };
                self.viz_counter += 1;
                match renderer.render(self.dataset.df(), &spec, self.viz_counter) {
                    Ok(chart) => json!({
                        "success": true,
                        "filename": chart.filename,
                        "path": chart.path.display().to_string(),
                        "url": chart.url,
                    }),
                    Err(e) => json!({ "error": e.to_string() }),
                }
            }
        }
    }
}

fn summary_columns(arguments: &Value) -> Result<Option<Vec<String>>, String> {
    match arguments.get("columns") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| "statistical_summary 'columns' must be a list of column names".to_string()),
    }
}
