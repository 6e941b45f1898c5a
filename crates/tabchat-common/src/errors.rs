/// Errors the engine facade surfaces to its caller (the HTTP layer or the
/// CLI). Tool-level failures never reach this type; they travel back to the
/// model as `{"error": ...}` result payloads instead.
#[derive(Debug, thiserror::Error)]
pub enum TabchatError {
    #[error("no dataset uploaded for this session")]
    NoSession,

    #[error("session is busy with another request")]
    SessionBusy,

    #[error("no message provided")]
    EmptyMessage,

    #[error("data error: {0}")]
    Data(String),

    #[error("ai error: {0}")]
    Ai(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
