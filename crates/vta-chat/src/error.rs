//! Error types for the chat engine.

/// Errors from completion requests and knowledge-store calls.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered, but not with what was expected.
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("upload rejected: {0}")]
    Upload(String),
    #[error("delete rejected: {0}")]
    Delete(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported file: {0}")]
    UnsupportedFile(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Protocol(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
