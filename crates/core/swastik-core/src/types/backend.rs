//! Backend contract shared by adapters and the fallback orchestrator

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tier produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendTag {
    /// Primary agent service
    Primary,
    /// Secondary agent service
    Secondary,
    /// Local synthetic responder
    Offline,
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendTag::Primary => write!(f, "primary"),
            BackendTag::Secondary => write!(f, "secondary"),
            BackendTag::Offline => write!(f, "offline"),
        }
    }
}

/// Backend currently considered healthy for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackendMode {
    /// Primary is tried first, secondary on failure
    #[default]
    #[serde(rename = "primary")]
    UsingPrimary,
    /// Primary has failed; only secondary is tried
    #[serde(rename = "secondary")]
    UsingSecondary,
    /// Both failed; no network calls are made
    #[serde(rename = "offline")]
    Offline,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendMode::UsingPrimary => write!(f, "primary"),
            BackendMode::UsingSecondary => write!(f, "secondary"),
            BackendMode::Offline => write!(f, "offline"),
        }
    }
}

/// One upstream agent service behind a uniform send/reply contract
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Human-readable backend name, used in logs
    fn name(&self) -> &str;

    /// Send one user message and return the extracted reply text
    async fn send(&self, message: &str) -> Result<String, BackendError>;
}

/// Reply produced for one user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Reply text
    pub content: String,
    /// Tier that produced it
    pub tag: BackendTag,
}

impl TurnReply {
    /// Create a reply
    pub fn new(content: impl Into<String>, tag: BackendTag) -> Self {
        Self {
            content: content.into(),
            tag,
        }
    }
}

/// Produces exactly one reply per user turn.
///
/// Implementations never fail; degraded operation is expressed through the
/// reply's tag.
#[async_trait]
pub trait TurnEngine: Send {
    /// Answer one user message
    async fn respond(&mut self, message: &str) -> TurnReply;

    /// Current backend mode
    fn mode(&self) -> BackendMode;

    /// Forget all health knowledge and start over from the primary backend
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_primary() {
        assert_eq!(BackendMode::default(), BackendMode::UsingPrimary);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&BackendMode::UsingSecondary).unwrap(),
            "\"secondary\""
        );
        assert_eq!(serde_json::to_string(&BackendTag::Offline).unwrap(), "\"offline\"");
        assert_eq!(BackendMode::Offline.to_string(), "offline");
        assert_eq!(BackendTag::Primary.to_string(), "primary");
    }
}
