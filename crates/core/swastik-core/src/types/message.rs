//! Chat message types

use super::backend::BackendTag;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display format for message timestamps (`09:05 AM`)
pub const TIMESTAMP_FORMAT: &str = "%I:%M %p";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Typed by the person at the keyboard
    User,
    /// Produced by a backend or the offline responder
    Assistant,
}

/// A single entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id
    pub id: Uuid,
    /// Author role
    pub role: ChatRole,
    /// Message text
    pub content: String,
    /// Display-formatted local time of creation
    pub timestamp: String,
    /// Tier that produced an assistant reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendTag>,
}

impl ChatMessage {
    /// Create a user message stamped with the current local time
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), None)
    }

    /// Create an assistant message stamped with the current local time
    pub fn assistant(content: impl Into<String>, backend: Option<BackendTag>) -> Self {
        Self::new(ChatRole::Assistant, content.into(), backend)
    }

    fn new(role: ChatRole, content: String, backend: Option<BackendTag>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: display_time(),
            backend,
        }
    }
}

/// Current local time rendered for display
pub fn display_time() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}
