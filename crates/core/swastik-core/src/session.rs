//! Chat session: conversation store plus single-flight turn execution

use crate::conversation::Conversation;
use crate::types::{BackendMode, ChatMessage, TurnEngine};
use crate::{Result, SwastikError};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Messages appended by one completed turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// The submitted user message
    pub user: ChatMessage,
    /// The reply appended after it
    pub reply: ChatMessage,
    /// Backend mode after the turn
    pub mode: BackendMode,
}

/// One user's conversation with the assistant.
///
/// At most one turn runs at a time. A submission made while another is in
/// flight is rejected with [`SwastikError::Busy`] and leaves the
/// conversation untouched.
///
/// Once the user message is recorded the turn runs on its own task, so the
/// reply is still appended if the caller stops waiting.
pub struct ChatSession {
    engine: Arc<Mutex<Box<dyn TurnEngine>>>,
    conversation: Arc<RwLock<Conversation>>,
    mode: Arc<RwLock<BackendMode>>,
}

impl ChatSession {
    /// Start a session opened by the welcome message
    pub fn new(engine: impl TurnEngine + 'static) -> Self {
        let mode = engine.mode();
        Self {
            engine: Arc::new(Mutex::new(Box::new(engine))),
            conversation: Arc::new(RwLock::new(Conversation::with_welcome())),
            mode: Arc::new(RwLock::new(mode)),
        }
    }

    /// Submit user input and wait for the reply
    ///
    /// Input is trimmed; blank input is rejected before anything is recorded.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome> {
        let text = input.trim().to_string();
        if text.is_empty() {
            return Err(SwastikError::validation("message is empty"));
        }

        let mut engine = self
            .engine
            .clone()
            .try_lock_owned()
            .map_err(|_| SwastikError::Busy)?;

        let user = self
            .conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_user(text.as_str())
            .clone();
        tracing::debug!(message_id = %user.id, "user message recorded");

        let conversation = self.conversation.clone();
        let mode_slot = self.mode.clone();
        // the engine lock moves into the task and is released after the reply lands
        let turn = tokio::spawn(async move {
            let reply = engine.respond(&text).await;
            let mode = engine.mode();
            *mode_slot.write().unwrap_or_else(PoisonError::into_inner) = mode;

            let reply = conversation
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push_assistant(reply.content, reply.tag)
                .clone();
            let backend = reply.backend.map(|t| t.to_string()).unwrap_or_default();
            tracing::info!(%backend, %mode, "turn complete");
            (reply, mode)
        });

        let (reply, mode) = turn
            .await
            .map_err(|e| SwastikError::other(format!("turn task failed: {}", e)))?;
        Ok(TurnOutcome { user, reply, mode })
    }

    /// Whether a turn is currently in flight
    pub fn is_busy(&self) -> bool {
        self.engine.try_lock().is_err()
    }

    /// Snapshot of the conversation
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.conversation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .messages()
            .to_vec()
    }

    /// Backend mode as of the last completed turn
    pub fn mode(&self) -> BackendMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start over: fresh conversation and backend health
    pub fn reset(&self) -> Result<()> {
        let mut engine = self.engine.try_lock().map_err(|_| SwastikError::Busy)?;
        engine.reset();
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = engine.mode();
        *self
            .conversation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Conversation::with_welcome();
        tracing::info!("session reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEngine;
    use crate::types::{BackendTag, ChatRole};
    use std::time::Duration;

    #[tokio::test]
    async fn test_turn_appends_user_then_reply() {
        let engine = ScriptedEngine::replying("Ticket created", BackendTag::Secondary);
        let calls = engine.calls();
        let session = ChatSession::new(engine);

        let outcome = session.submit("  My invoice is wrong  ").await.unwrap();
        assert_eq!(outcome.user.content, "My invoice is wrong");
        assert_eq!(outcome.reply.content, "Ticket created");
        assert_eq!(outcome.reply.backend, Some(BackendTag::Secondary));

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].id, outcome.user.id);
        assert_eq!(messages[2].id, outcome.reply.id);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let engine = ScriptedEngine::replying("unused", BackendTag::Primary);
        let calls = engine.calls();
        let session = ChatSession::new(engine);

        for input in ["", "   ", "\n\t"] {
            let err = session.submit(input).await.unwrap_err();
            assert!(matches!(err, SwastikError::Validation(_)));
        }
        assert_eq!(session.messages().len(), 1);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_reply_per_turn() {
        let session = ChatSession::new(ScriptedEngine::replying("ok", BackendTag::Primary));
        for i in 0..5 {
            session.submit(&format!("question {i}")).await.unwrap();
        }
        let messages = session.messages();
        assert_eq!(messages.len(), 11);
        for pair in messages[1..].chunks(2) {
            assert_eq!(pair[0].role, ChatRole::User);
            assert_eq!(pair[1].role, ChatRole::Assistant);
        }
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_busy() {
        let (engine, gate) = ScriptedEngine::gated("slow reply", BackendTag::Primary);
        let session = Arc::new(ChatSession::new(engine));

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("first").await })
        };
        // let the first turn take the lock and park on the gate
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        let err = session.submit("second").await.unwrap_err();
        assert!(matches!(err, SwastikError::Busy));
        assert!(matches!(session.reset(), Err(SwastikError::Busy)));

        gate.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.reply.content, "slow reply");

        let contents: Vec<String> = session.messages().into_iter().map(|m| m.content).collect();
        assert_eq!(contents.len(), 3);
        assert!(!contents.contains(&"second".to_string()));
    }

    #[tokio::test]
    async fn test_reset_starts_fresh_conversation() {
        let session = ChatSession::new(ScriptedEngine::replying("ok", BackendTag::Primary));
        session.submit("hello").await.unwrap();
        assert_eq!(session.messages().len(), 3);

        session.reset().unwrap();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.mode(), BackendMode::UsingPrimary);
    }

    #[tokio::test]
    async fn test_abandoned_turn_still_gets_its_reply() {
        let (engine, gate) = ScriptedEngine::gated("late reply", BackendTag::Secondary);
        let session = ChatSession::new(engine);

        let waited = tokio::time::timeout(Duration::from_millis(50), session.submit("hello")).await;
        assert!(waited.is_err());
        assert!(session.is_busy());

        gate.notify_one();
        while session.is_busy() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let messages = session.messages();
        let users = messages.iter().filter(|m| m.role == ChatRole::User).count();
        let replies = messages.iter().filter(|m| m.backend.is_some()).count();
        assert_eq!(users, 1);
        assert_eq!(replies, 1);
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].content, "late reply");

        // the session accepts the next turn once the abandoned one lands
        gate.notify_one();
        let outcome = session.submit("next").await.unwrap();
        assert_eq!(outcome.reply.content, "late reply");
        assert_eq!(session.messages().len(), 5);
    }
}
