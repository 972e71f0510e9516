//! Error types for the chat assistant.

use agency_core::error::AgencyError;

/// Errors from the chat engine.
///
/// None of these is fatal to a session: backend errors are turned into fixed
/// replies by the composer and blank input is dropped before classification.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("backend error: {0}")]
    Backend(String),
    #[error("session is closed")]
    SessionClosed,
    #[error("too many messages waiting, try again shortly")]
    QueueFull,
}

impl From<AgencyError> for ChatError {
    fn from(err: AgencyError) -> Self {
        ChatError::Backend(err.to_string())
    }
}
