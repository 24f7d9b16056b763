//! Append-only conversation log

use crate::types::{BackendTag, ChatMessage};
use serde::Serialize;

/// Greeting that opens every session
pub const WELCOME_MESSAGE: &str = "Hi, I'm SWASTIK – your orchestration copilot. \
    I can coordinate multiple specialized agents to help you.";

/// Ordered, append-only sequence of chat messages.
///
/// Messages are never edited or removed; a new session starts a new
/// conversation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation opened by the assistant's welcome message
    pub fn with_welcome() -> Self {
        let mut conversation = Self::new();
        conversation.push(ChatMessage::assistant(WELCOME_MESSAGE, None));
        conversation
    }

    /// Append the user's message
    pub fn push_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatMessage::user(content))
    }

    /// Append an assistant reply produced by `tag`
    pub fn push_assistant(&mut self, content: impl Into<String>, tag: BackendTag) -> &ChatMessage {
        self.push(ChatMessage::assistant(content, Some(tag)))
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// All messages in insertion order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRole;

    #[test]
    fn test_welcome_opens_session() {
        let conversation = Conversation::with_welcome();
        assert_eq!(conversation.messages().len(), 1);
        let first = &conversation.messages()[0];
        assert_eq!(first.role, ChatRole::Assistant);
        assert_eq!(first.content, WELCOME_MESSAGE);
        assert!(first.backend.is_none());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut conversation = Conversation::new();
        conversation.push_user("My invoice is wrong");
        conversation.push_assistant("Looking into it", BackendTag::Primary);
        conversation.push_user("Thanks");

        let contents: Vec<&str> = conversation
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["My invoice is wrong", "Looking into it", "Thanks"]);
        assert_eq!(conversation.messages()[2].role, ChatRole::User);
    }
}
