//! Error taxonomy for the chat state subsystem
//!
//! Storage failures are never surfaced to the user: callers log them and fall
//! back to "nothing was stored". Only remote call failures become visible, as
//! `Error:` lines in the conversation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Durable store could not be opened, read or written
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Persisted JSON could not be decoded
    #[error("cache corrupt: {0}")]
    CacheCorrupt(#[from] serde_json::Error),

    /// Network or service error from the remote chat endpoint
    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),

    /// Request rejected before it was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        ChatError::StorageUnavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for ChatError {
    fn from(err: rusqlite::Error) -> Self {
        ChatError::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::RemoteCallFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
