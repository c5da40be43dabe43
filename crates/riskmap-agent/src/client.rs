//! HTTP client for the remote portfolio agent.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::protocol::AgentRequest;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("agent returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("agent did not answer within {0:?}")]
    Timeout(Duration),
    #[error("no agent configured")]
    Offline,
}

/// Connection settings for the agent endpoint.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub url: String,
    pub agent_id: String,
    pub thread_id: i64,
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/api/agent/chat".into(),
            agent_id: "portfolio-assistant".into(),
            thread_id: 1,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Anything that can carry an [`AgentRequest`] and return the raw reply.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn send(&self, request: &AgentRequest) -> Result<Value, AgentError>;
}

/// Transport for keyword-only use. Every send fails with
/// [`AgentError::Offline`], so agent-mode queries fall back.
pub struct OfflineTransport;

#[async_trait]
impl AgentTransport for OfflineTransport {
    async fn send(&self, _request: &AgentRequest) -> Result<Value, AgentError> {
        Err(AgentError::Offline)
    }
}

/// `reqwest` transport posting JSON to a single endpoint.
pub struct AgentClient {
    client: reqwest::Client,
    url: String,
}

impl AgentClient {
    /// Create a client for the given endpoint URL.
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AgentTransport for AgentClient {
    async fn send(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        info!(url = %self.url, agent_id = %request.agent_id, "sending query to agent");
        let resp = self.client.post(&self.url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = resp.json().await?;
        info!("agent replied");
        Ok(payload)
    }
}
