//! Browser chat UI for SWASTIK
//!
//! Serves a single chat page plus a small JSON API over one shared
//! [`ChatSession`]:
//!
//! - `GET /api/messages`: conversation and mode
//! - `POST /api/chat`: run one turn (`400` on blank input, `409` while busy)
//! - `GET /api/mode`
//! - `POST /api/reset`
//! - `GET /logs`: scrubbed log events as server-sent events, when enabled

mod page;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use swastik_core::{
    scrub_message, subscribe_logs, BackendMode, ChatMessage, ChatSession, Result, SwastikError,
    TurnOutcome,
};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::trace::TraceLayer;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct SimpleUiConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub logs_enabled: bool,
}

impl Default for SimpleUiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".into(),
            port: 4000,
            logs_enabled: false,
        }
    }
}

#[derive(Clone)]
pub struct SimpleUiServer {
    pub config: Arc<SimpleUiConfig>,
    pub session: Arc<ChatSession>,
}

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationOutput {
    pub messages: Vec<ChatMessage>,
    pub mode: BackendMode,
    pub busy: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeOutput {
    pub mode: BackendMode,
    pub busy: bool,
}

/// API error mapped onto an HTTP status
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<SwastikError> for ApiError {
    fn from(err: SwastikError) -> Self {
        match err {
            SwastikError::Validation(msg) => ApiError::BadRequest(msg),
            SwastikError::Busy => ApiError::Conflict(SwastikError::Busy.to_string()),
            other => {
                tracing::error!("chat request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl SimpleUiServer {
    pub fn new(config: SimpleUiConfig, session: Arc<ChatSession>) -> Self {
        Self {
            config: Arc::new(config),
            session,
        }
    }

    pub fn router(&self) -> Router {
        let mut r = Router::new()
            .route("/", get(index))
            .route("/api/messages", get(messages))
            .route("/api/chat", post(chat))
            .route("/api/mode", get(mode))
            .route("/api/reset", post(reset));
        if self.config.logs_enabled {
            r = r.route("/logs", get(ui_logs_sse));
        }
        r.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
            .with_state(self.clone())
    }

    /// Bind and serve in the background until Ctrl-C
    pub async fn start(&self) -> Result<Option<JoinHandle<()>>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("web UI listening on http://{}", listener.local_addr()?);
        let router = self.router();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!("web UI stopped: {}", e);
            }
        });
        Ok(Some(handle))
    }
}

async fn index(State(state): State<SimpleUiServer>) -> Html<String> {
    Html(page::render(state.config.logs_enabled))
}

fn conversation(session: &ChatSession) -> ConversationOutput {
    ConversationOutput {
        messages: session.messages(),
        mode: session.mode(),
        busy: session.is_busy(),
    }
}

async fn messages(State(state): State<SimpleUiServer>) -> Json<ConversationOutput> {
    Json(conversation(&state.session))
}

async fn chat(
    State(state): State<SimpleUiServer>,
    Json(input): Json<ChatInput>,
) -> std::result::Result<Json<TurnOutcome>, ApiError> {
    let outcome = state.session.submit(&input.text).await?;
    Ok(Json(outcome))
}

async fn mode(State(state): State<SimpleUiServer>) -> Json<ModeOutput> {
    Json(ModeOutput {
        mode: state.session.mode(),
        busy: state.session.is_busy(),
    })
}

async fn reset(
    State(state): State<SimpleUiServer>,
) -> std::result::Result<Json<ConversationOutput>, ApiError> {
    state.session.reset()?;
    Ok(Json(conversation(&state.session)))
}

type LogStream = BoxStream<'static, std::result::Result<Event, Infallible>>;

async fn ui_logs_sse() -> Sse<LogStream> {
    let stream: LogStream = match subscribe_logs() {
        Some(rx) => BroadcastStream::new(rx)
            .filter_map(|item| async move {
                match item {
                    Ok(mut ev) => {
                        ev.message = scrub_message(ev.message);
                        let data = serde_json::to_string(&ev).unwrap_or_else(|_| "{}".to_string());
                        Some(Ok(Event::default().data(data)))
                    }
                    // lagged receivers skip what they missed
                    Err(_) => None,
                }
            })
            .boxed(),
        None => stream::once(async {
            Ok(Event::default().data(
                serde_json::json!({
                    "level": "INFO",
                    "target": "init",
                    "message": "logging not initialized",
                })
                .to_string(),
            ))
        })
        .boxed(),
    };
    Sse::new(stream)
}
