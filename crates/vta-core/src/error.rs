use thiserror::Error;

/// Top-level error type for the Virtual TA.
///
/// Covers configuration and local I/O. Network failures belong to the chat
/// crate's `ChatError` and never reach this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VtaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for VtaError {
    fn from(err: toml::de::Error) -> Self {
        VtaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VtaError {
    fn from(err: toml::ser::Error) -> Self {
        VtaError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Virtual TA operations.
pub type Result<T> = std::result::Result<T, VtaError>;
