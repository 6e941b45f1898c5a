//! Session-local types.

use serde::{Deserialize, Serialize};

use crate::Role;

/// One history entry. Only user and assistant text is replayed across turns;
/// the invocation records stay attached to the assistant message that
/// triggered them and are never replayed or mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
        }
    }
}

/// Record of one executed tool call, for the response payload and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: serde_json::Value,
    pub result: serde_json::Value,
}

/// Everything one chat turn produced.
#[derive(Debug)]
pub struct ChatOutcome {
    pub reply: String,
    pub invocations: Vec<ToolInvocation>,
    pub visualizations: Vec<String>,
}

/// The dispatchable tool set. Anything else becomes an
/// `Unknown function` error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolName {
    DataframeInfo,
    StatisticalSummary,
    PythonAnalysis,
    CreateVisualization,
}

impl ToolName {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "dataframe_info" => Some(Self::DataframeInfo),
            "statistical_summary" => Some(Self::StatisticalSummary),
            "python_analysis" => Some(Self::PythonAnalysis),
            "create_visualization" => Some(Self::CreateVisualization),
            _ => None,
        }
    }
}

/// Round-trip a tool result through a JSON string before it goes back to the
/// model, falling back to a stringified payload if that ever fails.
pub(crate) fn normalize_result(result: serde_json::Value) -> serde_json::Value {
    match serde_json::to_string(&result)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
    {
        Some(normalized) => normalized,
        None => serde_json::json!({ "data": result.to_string() }),
    }
}
