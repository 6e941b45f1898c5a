//! Conversation sessions: one uploaded dataset plus chat history, with the
//! automatic tool-call loop.

mod chat;
mod manager;
mod types;

pub use manager::Session;
pub use types::{ChatOutcome, StoredMessage, ToolInvocation};
