//! Test doubles for backends and turn engines

use crate::error::BackendError;
use crate::types::{AgentBackend, BackendMode, BackendTag, TurnEngine, TurnReply};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Backend that replays a fixed script of outcomes.
///
/// Once the script is exhausted the last outcome repeats. Every call is
/// counted and the received messages are kept for inspection.
pub struct ScriptedBackend {
    name: String,
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    last: Mutex<Option<Result<String, BackendError>>>,
    received: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    /// Backend replaying `script` in order
    pub fn new(
        name: impl Into<String>,
        script: impl IntoIterator<Item = Result<String, BackendError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            script: Mutex::new(script.into_iter().collect()),
            last: Mutex::new(None),
            received: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Backend that always answers `reply`
    pub fn succeeding(name: impl Into<String>, reply: impl Into<String>) -> Arc<Self> {
        Self::new(name, [Ok(reply.into())])
    }

    /// Backend that always fails with `err`
    pub fn failing(name: impl Into<String>, err: BackendError) -> Arc<Self> {
        Self::new(name, [Err(err)])
    }

    /// Number of `send` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages received so far, in order
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match next {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last.clone().unwrap_or(Err(BackendError::EmptyResponse)),
        }
    }
}

/// Turn engine with a canned reply, optionally held until released
pub struct ScriptedEngine {
    reply: TurnReply,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
    mode: BackendMode,
}

impl ScriptedEngine {
    /// Engine answering every turn with `content`
    pub fn replying(content: impl Into<String>, tag: BackendTag) -> Self {
        Self {
            reply: TurnReply::new(content, tag),
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
            mode: BackendMode::UsingPrimary,
        }
    }

    /// Engine whose turns wait for the returned [`Notify`] before answering
    pub fn gated(content: impl Into<String>, tag: BackendTag) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut engine = Self::replying(content, tag);
        engine.gate = Some(gate.clone());
        (engine, gate)
    }

    /// Shared call counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl TurnEngine for ScriptedEngine {
    async fn respond(&mut self, _message: &str) -> TurnReply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }

    fn mode(&self) -> BackendMode {
        self.mode
    }

    fn reset(&mut self) {
        self.mode = BackendMode::UsingPrimary;
    }
}
