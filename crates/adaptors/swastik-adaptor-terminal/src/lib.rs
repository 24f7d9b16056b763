//! Terminal chat for SWASTIK
//!
//! Reads one message per line and prints the conversation as
//! `[hh:mm AM] you: ...` / `[hh:mm AM] swastik (<tier>): ...` entries.

use std::sync::Arc;
use swastik_core::{
    scrub_message, subscribe_logs, ChatMessage, ChatRole, ChatSession, LogEvent, Result,
    SwastikError,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

const HELP: &str = "Commands:
  /mode   show which backend tier is answering
  /reset  start a new conversation and retry the primary agent
  /help   show this help
  /quit   leave the chat";

#[derive(Clone, Default)]
pub struct TerminalConfig {
    /// Echo log events to stderr while chatting
    pub show_logs: bool,
    /// Only echo log events whose target or message contains this text
    pub target_filter: Option<String>,
}

pub struct TerminalAdaptor {
    pub config: TerminalConfig,
    pub session: Arc<ChatSession>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Mode,
    Reset,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "/mode" => Some(Self::Mode),
            "/reset" => Some(Self::Reset),
            "/help" => Some(Self::Help),
            "/quit" | "/exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Render one conversation entry
pub fn format_message(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => format!("[{}] you: {}", message.timestamp, message.content),
        ChatRole::Assistant => match message.backend {
            Some(tag) => format!("[{}] swastik ({}): {}", message.timestamp, tag, message.content),
            None => format!("[{}] swastik: {}", message.timestamp, message.content),
        },
    }
}

/// Whether a log event matches the lowercase `filter` on target or message
fn passes_filter(ev: &LogEvent, filter: Option<&str>) -> bool {
    match filter {
        Some(f) => ev.target.to_lowercase().contains(f) || ev.message.to_lowercase().contains(f),
        None => true,
    }
}

impl TerminalAdaptor {
    pub fn new(config: TerminalConfig, session: Arc<ChatSession>) -> Self {
        Self { config, session }
    }

    /// Echo scrubbed log events to stderr until the log channel closes
    pub fn start_log_echo(&self) -> Option<JoinHandle<()>> {
        if !self.config.show_logs {
            return None;
        }
        let mut rx = subscribe_logs()?;
        let filter = self.config.target_filter.clone().map(|s| s.to_lowercase());
        Some(tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                if !passes_filter(&ev, filter.as_deref()) {
                    continue;
                }
                let msg = scrub_message(ev.message);
                eprintln!("[{}][{}] [{}] {}", ev.time, ev.level, ev.target, msg);
            }
        }))
    }

    /// Chat over stdin/stdout until `/quit` or end of input
    pub async fn run(&self) -> Result<()> {
        let echo = self.start_log_echo();
        let result = self
            .run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await;
        if let Some(handle) = echo {
            handle.abort();
        }
        result
    }

    /// Chat over any line reader and writer
    pub async fn run_with<R, W>(&self, reader: R, mut out: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        out.write_all(b"SWASTIK terminal chat (/help for commands)\n\n").await?;
        for message in self.session.messages() {
            write_line(&mut out, &format_message(&message)).await?;
        }

        let mut lines = reader.lines();
        loop {
            out.write_all(b"> ").await?;
            out.flush().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match Command::parse(&line) {
                Some(Command::Quit) => {
                    write_line(&mut out, "Goodbye.").await?;
                    break;
                }
                Some(Command::Help) => write_line(&mut out, HELP).await?,
                Some(Command::Mode) => {
                    write_line(&mut out, &format!("backend mode: {}", self.session.mode())).await?
                }
                Some(Command::Reset) => match self.session.reset() {
                    Ok(()) => {
                        write_line(&mut out, "-- new conversation --").await?;
                        for message in self.session.messages() {
                            write_line(&mut out, &format_message(&message)).await?;
                        }
                    }
                    Err(e) => write_line(&mut out, &format!("error: {}", e)).await?,
                },
                None if line.trim().is_empty() => continue,
                None => match self.session.submit(&line).await {
                    Ok(outcome) => {
                        write_line(&mut out, &format_message(&outcome.user)).await?;
                        write_line(&mut out, &format_message(&outcome.reply)).await?;
                    }
                    Err(SwastikError::Busy) => {
                        write_line(&mut out, "still waiting for the previous reply").await?
                    }
                    Err(e) => {
                        tracing::error!("turn failed: {}", e);
                        write_line(&mut out, &format!("error: {}", e)).await?;
                    }
                },
            }
        }
        out.flush().await?;
        Ok(())
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use swastik_core::testing::ScriptedEngine;
    use swastik_core::{BackendTag, WELCOME_MESSAGE};

    async fn chat(input: &str, engine: ScriptedEngine) -> (String, Arc<ChatSession>) {
        let session = Arc::new(ChatSession::new(engine));
        let adaptor = TerminalAdaptor::new(TerminalConfig::default(), session.clone());
        let mut out = Vec::new();
        adaptor.run_with(input.as_bytes(), &mut out).await.unwrap();
        (String::from_utf8(out).unwrap(), session)
    }

    #[tokio::test]
    async fn test_prints_welcome_and_reply() {
        let engine = ScriptedEngine::replying("Ticket created", BackendTag::Secondary);
        let (out, session) = chat("My invoice is wrong\n/quit\n", engine).await;

        assert!(out.contains(WELCOME_MESSAGE));
        assert!(out.contains("] you: My invoice is wrong"));
        assert!(out.contains("] swastik (secondary): Ticket created"));
        assert!(out.trim_end().ends_with("Goodbye."));
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_lines_and_commands_skip_engine() {
        let engine = ScriptedEngine::replying("unused", BackendTag::Primary);
        let calls = engine.calls();
        let (out, session) = chat("\n   \n/mode\n/help\n", engine).await;

        assert!(out.contains("backend mode: primary"));
        assert!(out.contains("/reset"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_starts_new_conversation() {
        let engine = ScriptedEngine::replying("done", BackendTag::Offline);
        let (out, session) = chat("first\n/reset\n", engine).await;

        assert!(out.contains("-- new conversation --"));
        assert_eq!(out.matches(WELCOME_MESSAGE).count(), 2);
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_log_filter_matches_target_or_message() {
        let ev = LogEvent {
            level: "WARN".into(),
            target: "swastik_provider_router".into(),
            message: "backend failed: Timed out after 4000ms".into(),
            time: "2026-01-01T00:00:00Z".into(),
        };
        assert!(passes_filter(&ev, None));
        assert!(passes_filter(&ev, Some("router")));
        assert!(passes_filter(&ev, Some("timed out")));
        assert!(!passes_filter(&ev, Some("openrouter")));
    }

    #[test]
    fn test_format_message() {
        let mut msg = ChatMessage::assistant("hello", Some(BackendTag::Primary));
        msg.timestamp = "09:05 AM".to_string();
        assert_eq!(format_message(&msg), "[09:05 AM] swastik (primary): hello");

        let mut msg = ChatMessage::user("hi");
        msg.timestamp = "09:06 AM".to_string();
        assert_eq!(format_message(&msg), "[09:06 AM] you: hi");
    }
}
