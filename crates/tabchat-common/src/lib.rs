//! Shared types for the tabchat workspace.

pub mod errors;
pub mod id;

pub use errors::TabchatError;
pub use id::{new_id, SessionId};

pub type Result<T> = std::result::Result<T, TabchatError>;
