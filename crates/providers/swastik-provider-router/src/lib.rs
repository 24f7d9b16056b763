//! Three-tier fallback routing for SWASTIK
//!
//! Each turn is answered by the primary backend, the secondary backend, or
//! the offline responder. The router remembers which tier last worked and
//! never moves back up the chain on its own; only [`FallbackRouter::reset`]
//! does that.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use swastik_core::{
    offline_reply, AgentBackend, BackendError, BackendMode, BackendTag, TurnEngine, TurnReply,
};

/// Router across primary, secondary and offline tiers
pub struct FallbackRouter {
    primary: Arc<dyn AgentBackend>,
    secondary: Arc<dyn AgentBackend>,
    mode: BackendMode,
}

impl FallbackRouter {
    /// Create router starting in [`BackendMode::UsingPrimary`]
    pub fn new(primary: Arc<dyn AgentBackend>, secondary: Arc<dyn AgentBackend>) -> Self {
        Self {
            primary,
            secondary,
            mode: BackendMode::UsingPrimary,
        }
    }

    /// Current mode
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Return to [`BackendMode::UsingPrimary`]
    pub fn reset(&mut self) {
        if self.mode != BackendMode::UsingPrimary {
            tracing::info!(from = %self.mode, "backend mode reset to primary");
        }
        self.mode = BackendMode::UsingPrimary;
    }

    /// Answer one message, updating the mode from the outcome
    pub async fn route(&mut self, message: &str) -> TurnReply {
        match self.mode {
            BackendMode::UsingPrimary => {
                let primary = attempt(self.primary.as_ref(), BackendTag::Primary, message).await;
                match primary {
                    Ok(reply) => TurnReply::new(reply, BackendTag::Primary),
                    Err(_) => self.try_secondary(message).await,
                }
            }
            BackendMode::UsingSecondary => self.try_secondary(message).await,
            BackendMode::Offline => {
                tracing::debug!("offline mode, skipping backends");
                TurnReply::new(offline_reply(), BackendTag::Offline)
            }
        }
    }

    async fn try_secondary(&mut self, message: &str) -> TurnReply {
        let secondary = attempt(self.secondary.as_ref(), BackendTag::Secondary, message).await;
        match secondary {
            Ok(reply) => {
                self.transition(BackendMode::UsingSecondary);
                TurnReply::new(reply, BackendTag::Secondary)
            }
            Err(_) => {
                self.transition(BackendMode::Offline);
                TurnReply::new(offline_reply(), BackendTag::Offline)
            }
        }
    }

    fn transition(&mut self, next: BackendMode) {
        if self.mode != next {
            tracing::warn!(from = %self.mode, to = %next, "backend mode changed");
            self.mode = next;
        }
    }
}

async fn attempt(
    backend: &dyn AgentBackend,
    tier: BackendTag,
    message: &str,
) -> Result<String, BackendError> {
    let start = Instant::now();
    tracing::info!(%tier, backend = backend.name(), "trying backend");
    let result = backend.send(message).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => tracing::info!(%tier, backend = backend.name(), elapsed_ms, "backend replied"),
        Err(e) => tracing::warn!(
            %tier,
            backend = backend.name(),
            kind = e.kind(),
            elapsed_ms,
            "backend failed: {}",
            e
        ),
    }
    result
}

#[async_trait]
impl TurnEngine for FallbackRouter {
    async fn respond(&mut self, message: &str) -> TurnReply {
        self.route(message).await
    }

    fn mode(&self) -> BackendMode {
        self.mode
    }

    fn reset(&mut self) {
        FallbackRouter::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use swastik_core::testing::ScriptedBackend;
    use swastik_core::{ChatRole, ChatSession, OFFLINE_REPLY};

    fn router(primary: &Arc<ScriptedBackend>, secondary: &Arc<ScriptedBackend>) -> FallbackRouter {
        FallbackRouter::new(primary.clone(), secondary.clone())
    }

    #[tokio::test]
    async fn test_primary_success_stays_primary() {
        let primary = ScriptedBackend::succeeding("wxo", "Your invoice has been corrected.");
        let secondary = ScriptedBackend::succeeding("openrouter", "unused");
        let mut r = router(&primary, &secondary);

        let reply = r.route("My invoice is wrong").await;
        assert_eq!(reply, TurnReply::new("Your invoice has been corrected.", BackendTag::Primary));
        assert_eq!(r.mode(), BackendMode::UsingPrimary);
        assert_eq!(primary.received(), vec!["My invoice is wrong"]);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_falls_to_secondary_and_sticks() {
        let primary =
            ScriptedBackend::failing("wxo", BackendError::upstream(Some(404), "not found"));
        let secondary = ScriptedBackend::succeeding("openrouter", "Ticket created");
        let mut r = router(&primary, &secondary);

        let reply = r.route("help").await;
        assert_eq!(reply, TurnReply::new("Ticket created", BackendTag::Secondary));
        assert_eq!(r.mode(), BackendMode::UsingSecondary);

        for _ in 0..3 {
            let reply = r.route("again").await;
            assert_eq!(reply.tag, BackendTag::Secondary);
        }
        // primary is never retried while secondary is healthy
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 4);
    }

    #[tokio::test]
    async fn test_both_fail_goes_offline() {
        let primary =
            ScriptedBackend::failing("wxo", BackendError::Timeout(Duration::from_secs(4)));
        let secondary =
            ScriptedBackend::failing("openrouter", BackendError::missing("OPENROUTER_API_KEY"));
        let mut r = router(&primary, &secondary);

        let reply = r.route("anything").await;
        assert_eq!(reply.tag, BackendTag::Offline);
        assert_eq!(reply.content, OFFLINE_REPLY);
        assert!(reply.content.lines().any(|l| l == "Category: technical"));
        assert_eq!(r.mode(), BackendMode::Offline);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_makes_no_calls() {
        let primary = ScriptedBackend::failing("wxo", BackendError::EmptyResponse);
        let secondary = ScriptedBackend::failing("openrouter", BackendError::EmptyResponse);
        let mut r = router(&primary, &secondary);
        r.route("first").await;

        let replies: Vec<TurnReply> = {
            let mut out = Vec::new();
            for msg in ["second", "third", "fourth"] {
                out.push(r.route(msg).await);
            }
            out
        };
        for reply in &replies {
            assert_eq!(reply, &TurnReply::new(OFFLINE_REPLY, BackendTag::Offline));
        }
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(r.mode(), BackendMode::Offline);
    }

    #[tokio::test]
    async fn test_secondary_failure_after_recovery_goes_offline() {
        let primary = ScriptedBackend::failing("wxo", BackendError::EmptyResponse);
        let secondary = ScriptedBackend::new(
            "openrouter",
            [Ok("first answer".to_string()), Err(BackendError::Timeout(Duration::from_secs(4)))],
        );
        let mut r = router(&primary, &secondary);

        assert_eq!(r.route("one").await.tag, BackendTag::Secondary);
        let reply = r.route("two").await;
        assert_eq!(reply.tag, BackendTag::Offline);
        assert_eq!(r.mode(), BackendMode::Offline);
        // second turn went straight to secondary
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_at_most_two_attempts_per_turn() {
        let primary = ScriptedBackend::failing("wxo", BackendError::EmptyResponse);
        let secondary = ScriptedBackend::failing("openrouter", BackendError::EmptyResponse);
        let mut r = router(&primary, &secondary);
        r.route("only turn").await;
        assert_eq!(primary.calls() + secondary.calls(), 2);
    }

    #[tokio::test]
    async fn test_reset_retries_primary() {
        let primary = ScriptedBackend::new(
            "wxo",
            [Err(BackendError::EmptyResponse), Ok("back online".to_string())],
        );
        let secondary = ScriptedBackend::failing("openrouter", BackendError::EmptyResponse);
        let mut r = router(&primary, &secondary);

        r.route("down").await;
        assert_eq!(r.mode(), BackendMode::Offline);

        r.reset();
        assert_eq!(r.mode(), BackendMode::UsingPrimary);
        let reply = r.route("up?").await;
        assert_eq!(reply, TurnReply::new("back online", BackendTag::Primary));
    }

    #[tokio::test]
    async fn test_session_scenarios() {
        let primary = ScriptedBackend::failing("wxo", BackendError::upstream(Some(500), "boom"));
        let secondary = ScriptedBackend::succeeding("openrouter", "Ticket created");
        let session = ChatSession::new(router(&primary, &secondary));

        let outcome = session.submit("My invoice is wrong").await.unwrap();
        assert_eq!(outcome.reply.content, "Ticket created");
        assert_eq!(outcome.mode, BackendMode::UsingSecondary);
        assert_eq!(session.mode(), BackendMode::UsingSecondary);

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "My invoice is wrong");
        assert_eq!(messages[2].backend, Some(BackendTag::Secondary));

        // blank input reaches no backend
        assert!(session.submit("   ").await.is_err());
        assert_eq!(primary.calls() + secondary.calls(), 2);
        assert_eq!(session.messages().len(), 3);
    }
}
