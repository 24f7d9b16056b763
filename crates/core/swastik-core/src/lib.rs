//! SWASTIK core
//!
//! Shared building blocks for the SWASTIK orchestration copilot:
//!
//! - Backend contract implemented by every upstream agent adapter
//! - Error taxonomy for adapter failures
//! - Timeout race and lenient reply extraction used by adapters
//! - Offline responder used when no backend is reachable
//! - Conversation store and single-flight chat session
//! - Environment configuration and logging
//!
//! # Example
//!
//! ```no_run
//! use swastik_core::*;
//!
//! # async fn run(engine: impl TurnEngine + 'static) -> Result<()> {
//! let session = ChatSession::new(engine);
//! let outcome = session.submit("My invoice is wrong").await?;
//! println!("[{}] {}", outcome.reply.timestamp, outcome.reply.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use uuid::Uuid;

pub mod config;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod offline;
pub mod resilience;
pub mod session;
pub mod testing;
pub mod types;
pub mod utils;

pub use config::{
    get_env_bool, get_env_int, get_env_nonempty, get_env_or, get_required_env, load_env,
    load_env_from_path, missing_env,
};
pub use conversation::{Conversation, WELCOME_MESSAGE};
pub use error::{BackendError, Result, SwastikError};
pub use extract::{extract_reply, parse_reply};
pub use offline::{offline_reply, OFFLINE_REPLY};
pub use resilience::{race_timeout, BACKEND_TIMEOUT};
pub use session::{ChatSession, TurnOutcome};
pub use types::*;
pub use utils::{init_logging, init_logging_with, scrub_message, subscribe_logs, LogEvent};
