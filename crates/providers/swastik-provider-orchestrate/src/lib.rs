//! IBM watsonx Orchestrate agent backend for SWASTIK
//!
//! Talks to one Orchestrate agent through its chat-completions endpoint.
//! Credentials are either a static bearer token or an IBM Cloud API key that
//! is exchanged for a short-lived IAM access token on every call.

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

/// Default Orchestrate API host
pub const DEFAULT_BASE_URL: &str = "https://api.eu-de.watson-orchestrate.cloud.ibm.com";

/// Default IBM Cloud IAM host
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com";

/// Grant type for exchanging an API key at IAM
pub const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Where reply text may live in an Orchestrate response, most specific first
pub const REPLY_PATHS: &[&str] = &[
    "/choices/0/message/content",
    "/choices/0/content",
    "/output/generic/0/text",
    "/output/text",
    "/result/output/text",
    "/response",
    "/result",
    "/answer",
    "/text",
];

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

/// How requests are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Pre-issued bearer token (`WXO_BEARER_TOKEN`)
    Bearer(String),
    /// IBM Cloud API key exchanged at IAM per call (`IBM_API_KEY`)
    IamApiKey(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Bearer(_) => write!(f, "Bearer(<redacted>)"),
            Credential::IamApiKey(_) => write!(f, "IamApiKey(<redacted>)"),
        }
    }
}

/// Orchestrate backend settings
#[derive(Debug, Clone)]
pub struct OrchestrateConfig {
    /// API host, without trailing path
    pub base_url: String,
    /// IAM host used for API key exchange
    pub iam_url: String,
    /// Orchestrate agent id (`WXO_AGENT_ID`)
    pub agent_id: Option<String>,
    /// Credential; a static bearer wins over an API key
    pub credential: Option<Credential>,
    /// Bound for one complete call, token exchange included
    pub timeout: Duration,
}

impl Default for OrchestrateConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            iam_url: DEFAULT_IAM_URL.to_string(),
            agent_id: None,
            credential: None,
            timeout: BACKEND_TIMEOUT,
        }
    }
}

impl OrchestrateConfig {
    /// Read settings from `WXO_*` / `IBM_*` environment variables
    pub fn from_env() -> Self {
        let credential = get_env_nonempty("WXO_BEARER_TOKEN")
            .map(Credential::Bearer)
            .or_else(|| get_env_nonempty("IBM_API_KEY").map(Credential::IamApiKey));
        Self {
            base_url: get_env_or("WXO_BASE_URL", DEFAULT_BASE_URL),
            iam_url: get_env_or("IBM_IAM_URL", DEFAULT_IAM_URL),
            agent_id: get_env_nonempty("WXO_AGENT_ID"),
            credential,
            timeout: BACKEND_TIMEOUT,
        }
    }

    /// Names of the settings that still need a value
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.agent_id.is_none() {
            missing.push("WXO_AGENT_ID");
        }
        if self.credential.is_none() {
            missing.push("WXO_BEARER_TOKEN or IBM_API_KEY");
        }
        missing
    }

    fn chat_url(&self, agent_id: &str) -> String {
        format!(
            "{}/v1/orchestrate/{}/chat/completions",
            self.base_url.trim_end_matches('/'),
            agent_id
        )
    }

    fn token_url(&self) -> String {
        format!("{}/identity/token", self.iam_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    stream: bool,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
}

/// Orchestrate agent client
pub struct OrchestrateClient {
    client: Client,
    config: OrchestrateConfig,
}

impl OrchestrateClient {
    /// Create a client with shared connection pool
    pub fn new(config: OrchestrateConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create a client from environment variables
    pub fn from_env() -> Self {
        Self::new(OrchestrateConfig::from_env())
    }

    /// Active settings
    pub fn config(&self) -> &OrchestrateConfig {
        &self.config
    }

    async fn access_token(&self, credential: &Credential) -> Result<String, BackendError> {
        let api_key = match credential {
            Credential::Bearer(token) => return Ok(token.clone()),
            Credential::IamApiKey(key) => key,
        };

        let resp = self
            .client
            .post(self.config.token_url())
            .header("Accept", "application/json")
            .form(&[("grant_type", IAM_GRANT_TYPE), ("apikey", api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(BackendError::upstream(
                Some(status.as_u16()),
                format!("IAM token exchange failed: {}", error_text),
            ));
        }

        let token: IamTokenResponse = resp.json().await?;
        tracing::debug!("obtained IAM access token");
        Ok(token.access_token)
    }

    async fn exchange(
        &self,
        agent_id: &str,
        credential: &Credential,
        message: &str,
    ) -> Result<String, BackendError> {
        let token = self.access_token(credential).await?;
        let request = ChatRequest {
            stream: false,
            messages: vec![RequestMessage {
                role: "user",
                content: message,
            }],
        };

        let resp = self
            .client
            .post(self.config.chat_url(agent_id))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "orchestrate responded");
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(BackendError::upstream(Some(status.as_u16()), error_text));
        }

        let body = resp.text().await?;
        parse_reply(&body, REPLY_PATHS)
    }
}

#[async_trait]
impl AgentBackend for OrchestrateClient {
    fn name(&self) -> &str {
        "watsonx-orchestrate"
    }

    async fn send(&self, message: &str) -> Result<String, BackendError> {
        let (agent_id, credential) = match (&self.config.agent_id, &self.config.credential) {
            (Some(agent_id), Some(credential)) => (agent_id, credential),
            _ => return Err(BackendError::missing(self.config.missing().join(", "))),
        };
        race_timeout(
            self.config.timeout,
            self.exchange(agent_id, credential, message),
        )
        .await
    }
}
