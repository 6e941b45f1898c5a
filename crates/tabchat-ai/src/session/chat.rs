//! The per-turn tool-call loop.

use tracing::debug;

use tabchat_data::ChartRenderer;

use crate::{AiClient, AiError, Message, Role};

use super::manager::Session;
use super::types::{normalize_result, ChatOutcome, StoredMessage, ToolInvocation};

/// Canned model acknowledgement paired with the first-turn context message.
const FIRST_TURN_ACK: &str =
    "I understand. I'll help you analyze this CSV data. What would you like to know?";

/// Reply when the model ends a turn with tool calls but no text.
const FALLBACK_REPLY: &str = "I've processed the data.";

impl Session {
    /// Add a user message and get the assistant's reply, running tool calls
    /// until the model answers in text or the round budget runs out.
    pub async fn chat(
        &mut self,
        client: &dyn AiClient,
        renderer: &dyn ChartRenderer,
        user_message: impl Into<String>,
    ) -> Result<ChatOutcome, AiError> {
        self.messages.push(StoredMessage::user(user_message));

        let mut wire = Vec::new();
        if self.messages.len() == 1 {
            wire.push(Message::user(self.first_turn_context()));
            wire.push(Message::assistant(FIRST_TURN_ACK));
        }
        for stored in &self.messages {
            wire.push(match stored.role {
                Role::User => Message::user(stored.content.clone()),
                _ => Message::assistant(stored.content.clone()),
            });
        }

        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut visualizations: Vec<String> = Vec::new();
        let mut rounds = 0u32;

        loop {
            let response = client.send_message(&wire, &self.tools).await?;
            self.tracker.record(&response.usage);

            if response.tool_calls.is_empty() {
                let reply = if response.content.trim().is_empty() {
                    FALLBACK_REPLY.to_string()
                } else {
                    response.content
                };
                self.messages
                    .push(StoredMessage::assistant(reply.clone(), invocations.clone()));
                return Ok(ChatOutcome {
                    reply,
                    invocations,
                    visualizations,
                });
            }

            rounds += 1;
            if rounds > self.max_tool_rounds {
                debug!(max = self.max_tool_rounds, "tool-call budget exhausted");
                return Err(AiError::ToolBudgetExceeded(self.max_tool_rounds));
            }

            wire.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = normalize_result(self.execute_tool(renderer, call));
                if result["success"] == serde_json::Value::Bool(true) {
                    if let Some(url) = result["url"].as_str() {
                        visualizations.push(url.to_string());
                    }
                }
                invocations.push(ToolInvocation {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: result.clone(),
                });
                wire.push(Message::tool_response(call.name.clone(), result));
            }
        }
    }

    /// Dataset briefing injected ahead of the first user turn.
    fn first_turn_context(&self) -> String {
        let info = self.dataset.info();
        let columns = info["columns"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        let dtypes = serde_json::to_string_pretty(&info["dtypes"]).unwrap_or_default();

        format!(
            "You are a helpful data analyst assistant. The user has uploaded a CSV file named \
             '{}' with the following structure:\n\
             - Rows: {}\n\
             - Columns: {}\n\
             - Column names: {}\n\
             - Data types: {}\n\n\
             You have access to analysis tools to help answer questions about this data. Use \
             the appropriate tools to provide accurate, helpful responses. When the user asks \
             follow-up questions, remember the context from previous messages.",
            self.filename, info["shape"]["rows"], info["shape"]["columns"], columns, dtypes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tabchat_data::{ChartFileRenderer, DatasetHandle};

    use crate::{AiResponse, TokenUsage, ToolCall, ToolDefinition};

    /// Scripted client: pops one response per call and records what it saw.
    struct FakeClient {
        script: Mutex<Vec<AiResponse>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl FakeClient {
        fn new(script: Vec<AiResponse>) -> Self {
            Self {
                script: Mutex::new(script),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<Vec<Message>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AiClient for FakeClient {
        async fn send_message(
            &self,
            messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> Result<AiResponse, AiError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(AiError::ApiError("script exhausted".into()));
            }
            Ok(script.remove(0))
        }
    }

    fn text(content: &str) -> AiResponse {
        AiResponse {
            content: content.to_string(),
            tool_calls: Vec::new(),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }
    }

    fn tool_call(name: &str, arguments: serde_json::Value) -> AiResponse {
        AiResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "t1".into(),
                name: name.into(),
                arguments,
            }],
            usage: TokenUsage::default(),
        }
    }

    fn session() -> Session {
        let sales = Series::new("sales".into(), &[100.0f64, 200.0, 300.0]);
        let city = Series::new("city".into(), &["a", "b", "a"]);
        let df = DataFrame::new(vec![sales.into_column(), city.into_column()]).unwrap();
        Session::new(DatasetHandle::new(df), "sales.csv")
    }

    fn renderer() -> (tempfile::TempDir, ChartFileRenderer) {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ChartFileRenderer::new(dir.path());
        (dir, renderer)
    }

    #[tokio::test]
    async fn plain_reply_is_stored() {
        let client = FakeClient::new(vec![text("Nice dataset!")]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "hello").await.unwrap();
        assert_eq!(outcome.reply, "Nice dataset!");
        assert!(outcome.invocations.is_empty());
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.tracker().call_count(), 1);
    }

    #[tokio::test]
    async fn first_turn_carries_dataset_briefing() {
        let client = FakeClient::new(vec![text("hi")]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        session.chat(&client, &renderer, "hello").await.unwrap();
        let seen = client.seen();
        let first_call = &seen[0];
        assert!(first_call[0].content.contains("data analyst assistant"));
        assert!(first_call[0].content.contains("sales.csv"));
        assert!(first_call[0].content.contains("sales, city"));
        assert_eq!(first_call[1].content, FIRST_TURN_ACK);
        assert_eq!(first_call[2].content, "hello");
    }

    #[tokio::test]
    async fn second_turn_skips_the_briefing() {
        let client = FakeClient::new(vec![text("one"), text("two")]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        session.chat(&client, &renderer, "first").await.unwrap();
        session.chat(&client, &renderer, "second").await.unwrap();
        let seen = client.seen();
        // replayed history only: first/one/second
        assert_eq!(seen[1].len(), 3);
        assert_eq!(seen[1][0].content, "first");
        assert_eq!(seen[1][2].content, "second");
    }

    #[tokio::test]
    async fn tool_round_trip_feeds_result_back() {
        let client = FakeClient::new(vec![
            tool_call("dataframe_info", json!({})),
            text("There are 3 rows."),
        ]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "how big?").await.unwrap();
        assert_eq!(outcome.reply, "There are 3 rows.");
        assert_eq!(outcome.invocations.len(), 1);
        assert_eq!(outcome.invocations[0].result["shape"]["rows"], json!(3));

        // the record stays attached to the stored assistant message
        let stored = session.messages().last().unwrap();
        assert_eq!(stored.tool_calls.len(), 1);
        assert_eq!(stored.tool_calls[0].name, "dataframe_info");

        // second request carries the functionCall turn and its result
        let seen = client.seen();
        let second = &seen[1];
        let assistant_turn = &second[second.len() - 2];
        assert_eq!(assistant_turn.tool_calls.len(), 1);
        let tool_turn = second.last().unwrap();
        let response = tool_turn.tool_response.as_ref().unwrap();
        assert_eq!(response.name, "dataframe_info");
        assert_eq!(response.result["shape"]["rows"], json!(3));
    }

    #[tokio::test]
    async fn unknown_tool_reports_error_to_model() {
        let client = FakeClient::new(vec![
            tool_call("drop_tables", json!({})),
            text("Sorry, I can't do that."),
        ]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "drop it").await.unwrap();
        assert_eq!(
            outcome.invocations[0].result,
            json!({"error": "Unknown function: drop_tables"})
        );
        assert_eq!(outcome.reply, "Sorry, I can't do that.");
    }

    #[tokio::test]
    async fn round_budget_is_fatal() {
        let client = FakeClient::new(vec![
            tool_call("dataframe_info", json!({})),
            tool_call("dataframe_info", json!({})),
            tool_call("dataframe_info", json!({})),
        ]);
        let (_dir, renderer) = renderer();
        let mut session = session().with_max_tool_rounds(2);

        let err = session
            .chat(&client, &renderer, "loop forever")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::ToolBudgetExceeded(2)));
    }

    #[tokio::test]
    async fn empty_final_text_falls_back() {
        let client = FakeClient::new(vec![tool_call("dataframe_info", json!({})), text("")]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "info").await.unwrap();
        assert_eq!(outcome.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn visualization_urls_are_collected() {
        let client = FakeClient::new(vec![
            tool_call(
                "create_visualization",
                json!({"viz_type": "bar", "x_column": "city", "y_column": "sales"}),
            ),
            text("Here's your chart."),
        ]);
        let (dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "chart it").await.unwrap();
        assert_eq!(outcome.visualizations, vec!["/viz/viz_1.json"]);
        assert!(dir.path().join("viz_1.json").exists());
    }

    #[tokio::test]
    async fn sandbox_analysis_round_trip() {
        let client = FakeClient::new(vec![
            tool_call("python_analysis", json!({"code": "result = df['sales'].sum()"})),
            text("Total sales are 600."),
        ]);
        let (_dir, renderer) = renderer();
        let mut session = session();

        let outcome = session.chat(&client, &renderer, "total?").await.unwrap();
        assert_eq!(
            outcome.invocations[0].result,
            json!({"type": "scalar", "value": 600.0})
        );
    }
}
