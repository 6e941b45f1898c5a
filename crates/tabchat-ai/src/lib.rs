//! AI orchestration for tabchat.
//!
//! Provides the Gemini client, tool declarations, the per-session tool-call
//! loop, and the engine facade the outer surface (HTTP handler or CLI) talks
//! to. Tool execution is delegated to `tabchat-data`; this crate only moves
//! JSON across the model boundary.

pub mod engine;
pub mod gemini;
pub mod session;
pub mod store;
pub mod token_tracker;
pub mod tools;

use async_trait::async_trait;

pub use engine::{Engine, UploadSummary};
pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{ChatOutcome, Session, ToolInvocation};
pub use store::{InMemorySessionStore, SessionStore};
pub use token_tracker::TokenTracker;

#[async_trait]
pub trait AiClient: Send + Sync {
    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError>;
}

/// One turn on the wire. Plain text turns leave `tool_calls` empty and
/// `tool_response` unset; a tool-result turn carries only `tool_response`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<ToolResponse>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::text(Role::Assistant, content)
        }
    }

    pub fn tool_response(name: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            tool_response: Some(ToolResponse {
                name: name.into(),
                result,
            }),
            ..Self::text(Role::Tool, String::new())
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_response: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AiResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Result of an executed tool call, echoed back to the model.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResponse {
    pub name: String,
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Tool-call budget of {0} rounds exceeded")]
    ToolBudgetExceeded(u32),
}

impl From<AiError> for tabchat_common::TabchatError {
    fn from(err: AiError) -> Self {
        tabchat_common::TabchatError::Ai(err.to_string())
    }
}
