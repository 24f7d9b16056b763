//! Core type definitions

pub mod backend;
pub mod message;

pub use backend::{AgentBackend, BackendMode, BackendTag, TurnEngine, TurnReply};
pub use message::{display_time, ChatMessage, ChatRole, TIMESTAMP_FORMAT};
