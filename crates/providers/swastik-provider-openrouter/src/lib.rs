//! OpenRouter chat-completions backend for SWASTIK

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use swastik_core::{
    get_env_nonempty, get_env_or, parse_reply, race_timeout, AgentBackend, BackendError,
    BACKEND_TIMEOUT,
};

/// Default OpenRouter API root
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Model used when `OPENROUTER_MODEL` is unset
pub const DEFAULT_MODEL: &str = "x-ai/grok-4.1-fast";

/// `X-Title` sent with every request
pub const APP_TITLE: &str = "SWASTIK Orchestration Agent";

/// Where reply text lives in an OpenRouter response
pub const REPLY_PATHS: &[&str] = &["/choices/0/message/content"];

/// Models known to work with the ticket prompt, as `(id, label)`
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("x-ai/grok-4.1-fast", "Grok 4.1 Fast (default)"),
    ("anthropic/claude-3.5-sonnet", "Claude 3.5 Sonnet"),
    ("anthropic/claude-3-haiku", "Claude 3 Haiku (Fast)"),
    ("openai/gpt-4o", "GPT-4o"),
    ("openai/gpt-4o-mini", "GPT-4o Mini"),
    ("google/gemini-pro-1.5", "Gemini Pro 1.5"),
    ("meta-llama/llama-3.1-70b-instruct", "Llama 3.1 70B"),
    ("microsoft/wizardlm-2-8x22b", "WizardLM 2 8x22B"),
    ("qwen/qwen-2.5-72b-instruct", "Qwen 2.5 72B"),
];

/// Instructions that make the model answer in SWASTIK's ticket format
pub const SYSTEM_PROMPT: &str = "You are SWASTIK, a fast customer service orchestration agent. Analyze customer issues and respond in this EXACT format:

Issue summary: [brief summary]
Category: [billing/technical/account/product/other]
Priority: [low/medium/high/critical]
Urgent: [Yes/No]
Sentiment: [positive/neutral/frustrated/angry]

Ticket

ID: N/A
Status: N/A
Action taken: N/A

Suggested reply to customer

Dear valued customer,

[Write a professional, empathetic response that directly addresses their concern. Keep it concise and helpful.]

Thank you for your patience and understanding.

Sincerely,
SWASTIK Support Team

Keep responses professional, empathetic, and actionable. Always acknowledge the customer's concern and provide clear next steps.";

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 800;

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|e| {
                    tracing::warn!("falling back to default HTTP client: {}", e);
                    Client::new()
                })
        })
        .clone()
}

/// OpenRouter backend settings
#[derive(Clone)]
pub struct OpenRouterConfig {
    /// API root, e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
    /// `OPENROUTER_API_KEY`
    pub api_key: Option<String>,
    /// Model id
    pub model: String,
    /// `HTTP-Referer` header identifying the calling site
    pub referer: String,
    /// Bound for one call
    pub timeout: Duration,
}

impl fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            referer: "http://localhost".to_string(),
            timeout: BACKEND_TIMEOUT,
        }
    }
}

impl OpenRouterConfig {
    /// Read settings from `OPENROUTER_*` environment variables
    pub fn from_env() -> Self {
        Self {
            base_url: get_env_or("OPENROUTER_BASE_URL", DEFAULT_BASE_URL),
            api_key: get_env_nonempty("OPENROUTER_API_KEY"),
            model: get_env_or("OPENROUTER_MODEL", DEFAULT_MODEL),
            referer: get_env_or("OPENROUTER_REFERER", "http://localhost"),
            timeout: BACKEND_TIMEOUT,
        }
    }

    /// Names of the settings that still need a value
    pub fn missing(&self) -> Vec<&'static str> {
        if self.api_key.is_none() {
            vec!["OPENROUTER_API_KEY"]
        } else {
            Vec::new()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: Vec<OpenRouterMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenRouterMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Result of probing the models endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    /// HTTP status of the models endpoint
    pub status: u16,
    /// Number of models listed
    pub model_count: usize,
    /// A few well-known model ids from the listing
    pub popular: Vec<String>,
}

/// OpenRouter API client
pub struct OpenRouterClient {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterClient {
    /// Create a client with shared connection pool
    pub fn new(config: OpenRouterConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create a client from environment variables
    pub fn from_env() -> Self {
        Self::new(OpenRouterConfig::from_env())
    }

    /// Active settings
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::missing("OPENROUTER_API_KEY"))
    }

    async fn complete(&self, api_key: &str, message: &str) -> Result<String, BackendError> {
        let request = OpenRouterRequest {
            model: &self.config.model,
            messages: vec![
                OpenRouterMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                OpenRouterMessage {
                    role: "user",
                    content: message,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let resp = self
            .client
            .post(self.config.url("chat/completions"))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!(
            status = status.as_u16(),
            model = %self.config.model,
            "openrouter responded"
        );
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(BackendError::upstream(
                Some(status.as_u16()),
                format!("OpenRouter API error: {}", error_text),
            ));
        }

        let body = resp.text().await?;
        parse_reply(&body, REPLY_PATHS)
    }

    /// Check connectivity through the models endpoint
    ///
    /// Diagnostics only; the fallback chain never calls this.
    pub async fn check_connection(&self) -> Result<ConnectionReport, BackendError> {
        let api_key = self.api_key()?;
        race_timeout(self.config.timeout, async {
            let resp = self
                .client
                .get(self.config.url("models"))
                .header("Authorization", format!("Bearer {}", api_key))
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(BackendError::upstream(Some(status.as_u16()), error_text));
            }
            let list: ModelList = resp.json().await?;
            let popular = list
                .data
                .iter()
                .map(|m| m.id.as_str())
                .filter(|id| id.contains("claude") || id.contains("gpt-4") || id.contains("gemini"))
                .take(5)
                .map(str::to_string)
                .collect();
            Ok(ConnectionReport {
                status: status.as_u16(),
                model_count: list.data.len(),
                popular,
            })
        })
        .await
    }
}

#[async_trait]
impl AgentBackend for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn send(&self, message: &str) -> Result<String, BackendError> {
        let api_key = self.api_key()?;
        race_timeout(self.config.timeout, self.complete(api_key, message)).await
    }
}
