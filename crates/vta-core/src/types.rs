use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Author of a chat message, as understood by the completion endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Context injected ahead of the conversation.
    System,
    /// Text typed by the person using the assistant.
    User,
    /// Reply produced by the completion endpoint.
    Assistant,
}

// =============================================================================
// Messages
// =============================================================================

/// A single chat turn. Immutable once appended to a transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
