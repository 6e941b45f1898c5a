//! Engine facade: the one entry point for the outer surface.
//!
//! Owns the session store, the AI client, and the chart renderer. Every
//! operation is keyed by `SessionId`; uploading a CSV creates or replaces
//! the caller's session, chatting runs the tool loop against it.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use tabchat_common::{Result, SessionId, TabchatError};
use tabchat_data::{ChartRenderer, DatasetHandle};

use crate::session::{ChatOutcome, Session};
use crate::store::SessionStore;
use crate::AiClient;

/// Upload response payload.
#[derive(Debug)]
pub struct UploadSummary {
    pub filename: String,
    pub info: Value,
    pub preview: Value,
    pub message: String,
}

/// Rows included in the upload preview.
const PREVIEW_ROWS: usize = 100;

pub struct Engine {
    store: Arc<dyn SessionStore>,
    client: Arc<dyn AiClient>,
    renderer: Arc<dyn ChartRenderer>,
    max_tool_rounds: u32,
}

impl Engine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        client: Arc<dyn AiClient>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            store,
            client,
            renderer,
            max_tool_rounds: 10,
        }
    }

    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Parse an uploaded CSV and bind it to the caller's session, replacing
    /// any dataset already there.
    pub async fn upload_csv(
        &self,
        id: &SessionId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadSummary> {
        let dataset = DatasetHandle::from_csv_bytes(bytes)
            .map_err(|e| TabchatError::Data(e.to_string()))?;
        let info = dataset.info();
        let preview = dataset.preview(PREVIEW_ROWS);
        let message = format!(
            "Successfully uploaded {} with {} rows and {} columns",
            filename, info["shape"]["rows"], info["shape"]["columns"],
        );
        info!(session = %id, filename, "dataset uploaded");

        let session = Session::new(dataset, filename).with_max_tool_rounds(self.max_tool_rounds);
        self.store.insert(id.clone(), session).await;

        Ok(UploadSummary {
            filename: filename.to_string(),
            info,
            preview,
            message,
        })
    }

    /// One chat turn. Rejects empty messages, sessions without a dataset,
    /// and sessions already serving a request.
    pub async fn chat(&self, id: &SessionId, message: &str) -> Result<ChatOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TabchatError::EmptyMessage);
        }

        let shared = self.store.get(id).await.ok_or(TabchatError::NoSession)?;
        let mut session = shared.try_lock().map_err(|_| TabchatError::SessionBusy)?;

        let outcome = session
            .chat(self.client.as_ref(), self.renderer.as_ref(), message)
            .await?;
        Ok(outcome)
    }

    /// Metadata for the session's dataset.
    pub async fn session_info(&self, id: &SessionId) -> Result<Value> {
        let shared = self.store.get(id).await.ok_or(TabchatError::NoSession)?;
        let session = shared.try_lock().map_err(|_| TabchatError::SessionBusy)?;
        Ok(session.dataset().info())
    }

    /// Drop the caller's session and dataset.
    pub async fn clear(&self, id: &SessionId) -> bool {
        self.store.remove(id).await
    }

    pub async fn active_sessions(&self) -> usize {
        self.store.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::store::InMemorySessionStore;
    use crate::{AiError, AiResponse, Message, TokenUsage, ToolDefinition};
    use tabchat_data::ChartFileRenderer;

    struct FakeClient {
        script: Mutex<Vec<AiResponse>>,
    }

    impl FakeClient {
        fn replying(texts: &[&str]) -> Self {
            Self {
                script: Mutex::new(
                    texts
                        .iter()
                        .map(|t| AiResponse {
                            content: t.to_string(),
                            tool_calls: Vec::new(),
                            usage: TokenUsage::default(),
                        })
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl AiClient for FakeClient {
        async fn send_message(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
        ) -> std::result::Result<AiResponse, AiError> {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                return Err(AiError::ApiError("script exhausted".into()));
            }
            Ok(script.remove(0))
        }
    }

    fn engine(client: FakeClient, dir: &std::path::Path) -> Engine {
        Engine::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(client),
            Arc::new(ChartFileRenderer::new(dir)),
        )
    }

    const CSV: &[u8] = b"sales,city\n100,a\n200,b\n300,a\n";

    #[tokio::test]
    async fn upload_then_chat() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(FakeClient::replying(&["Looks good."]), dir.path());
        let id = SessionId::new();

        let summary = engine.upload_csv(&id, "sales.csv", CSV).await.unwrap();
        assert_eq!(
            summary.message,
            "Successfully uploaded sales.csv with 3 rows and 2 columns"
        );
        assert_eq!(summary.preview["rows"].as_array().unwrap().len(), 3);
        assert_eq!(engine.active_sessions().await, 1);

        let outcome = engine.chat(&id, "what do you see?").await.unwrap();
        assert_eq!(outcome.reply, "Looks good.");
    }

    #[tokio::test]
    async fn chat_without_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(FakeClient::replying(&[]), dir.path());
        let err = engine
            .chat(&SessionId::new(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, TabchatError::NoSession));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(FakeClient::replying(&[]), dir.path());
        let id = SessionId::new();
        engine.upload_csv(&id, "sales.csv", CSV).await.unwrap();

        let err = engine.chat(&id, "   ").await.unwrap_err();
        assert!(matches!(err, TabchatError::EmptyMessage));
    }

    #[tokio::test]
    async fn busy_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemorySessionStore::new());
        let engine = Engine::new(
            store.clone(),
            Arc::new(FakeClient::replying(&["hi"])),
            Arc::new(ChartFileRenderer::new(dir.path())),
        );
        let id = SessionId::new();
        engine.upload_csv(&id, "sales.csv", CSV).await.unwrap();

        // hold the session lock as an in-flight request would
        let shared = store.get(&id).await.unwrap();
        let _guard = shared.lock().await;

        let err = engine.chat(&id, "hello").await.unwrap_err();
        assert!(matches!(err, TabchatError::SessionBusy));
    }

    #[tokio::test]
    async fn bad_csv_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(FakeClient::replying(&[]), dir.path());
        let err = engine
            .upload_csv(&SessionId::new(), "empty.csv", b"")
            .await
            .unwrap_err();
        assert!(matches!(err, TabchatError::Data(_)));
    }

    #[tokio::test]
    async fn clear_removes_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(FakeClient::replying(&[]), dir.path());
        let id = SessionId::new();
        engine.upload_csv(&id, "sales.csv", CSV).await.unwrap();

        assert!(engine.clear(&id).await);
        assert!(!engine.clear(&id).await);
        assert!(matches!(
            engine.chat(&id, "hello").await.unwrap_err(),
            TabchatError::NoSession
        ));
    }
}
