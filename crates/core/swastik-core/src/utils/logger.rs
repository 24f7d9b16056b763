//! Logging utilities

use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// A log record as forwarded to UI subscribers
#[derive(Clone, Debug, Serialize)]
pub struct LogEvent {
    /// Level name (`INFO`, `WARN`, ...)
    pub level: String,
    /// Emitting module path
    pub target: String,
    /// Rendered message followed by the other fields as `key=value`
    pub message: String,
    /// RFC 3339 time of the event
    pub time: String,
}

static LOG_TX: OnceCell<broadcast::Sender<LogEvent>> = OnceCell::new();

/// Subscribe to log events; `None` until [`init_logging`] has run
pub fn subscribe_logs() -> Option<broadcast::Receiver<LogEvent>> {
    LOG_TX.get().map(|tx| tx.subscribe())
}

/// Collects the message plus every other field as `key=value`
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<String>,
}

impl FieldVisitor {
    fn render(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let fields = self.fields.join(" ");
        if self.message.is_empty() {
            fields
        } else {
            format!("{} {}", self.message, fields)
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}

struct BroadcastLayer {
    tx: broadcast::Sender<LogEvent>,
}

impl<S> Layer<S> for BroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        // nobody listening
        if self.tx.receiver_count() == 0 {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        let ev = LogEvent {
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: visitor.render(),
            time: chrono::Utc::now().to_rfc3339(),
        };
        let _ = self.tx.send(ev);
    }
}

/// Initialize the global logging system
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter.
/// Calling this twice is harmless: the second subscriber is not installed.
pub fn init_logging(level: &str) {
    init_logging_with(level, true)
}

/// Like [`init_logging`], optionally without the stderr console layer
///
/// The terminal chat passes `console = false` so log lines do not interleave
/// with the conversation; events still reach [`subscribe_logs`].
pub fn init_logging_with(level: &str, console: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let tx = LOG_TX
        .get_or_init(|| {
            let (tx, _rx) = broadcast::channel(1024);
            tx
        })
        .clone();

    let fmt_layer = console.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(BroadcastLayer { tx })
        .try_init();
    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}
