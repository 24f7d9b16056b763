//! Utility functions

pub mod logger;
pub mod scrub;

pub use logger::{init_logging, init_logging_with, subscribe_logs, LogEvent};
pub use scrub::scrub_message;
