//! Transport client for the chat endpoint.
//!
//! One POST per send: the latest message plus the prior history, a bearer
//! token, and a JSON reply of the form `{ "reply": "..." }`. Every failure
//! kind maps to a [`TransportError`]; callers collapse them into a single
//! notice.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::message::Message;

/// Reply text used when the endpoint answers without a usable `reply` field.
pub const NO_REPLY: &str = "No reply received.";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the transport needs, injected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub endpoint_url: String,
    pub auth_token: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(endpoint_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            auth_token: auth_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Provider-neutral send operation. Enables mocking in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `latest` with the conversation that preceded it and return the
    /// reply text.
    async fn send(&self, latest: &str, history: &[Message]) -> Result<String, TransportError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn map_reqwest(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.config.timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, latest: &str, history: &[Message]) -> Result<String, TransportError> {
        let request = ChatRequest {
            message: latest,
            messages: history,
        };

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .header("Authorization", format!("Bearer {}", self.config.auth_token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_reqwest(e))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body)
    }
}

/// Extract the reply from a success body. The body must be a JSON object;
/// a missing, null or blank `reply` yields [`NO_REPLY`].
pub fn parse_reply(body: &str) -> Result<String, TransportError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TransportError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(TransportError::Malformed(format!(
            "expected a JSON object, got: {}",
            value
        )));
    }

    let response: ChatResponse =
        serde_json::from_value(value).map_err(|e| TransportError::Malformed(e.to_string()))?;

    Ok(response
        .reply
        .filter(|reply| !reply.trim().is_empty())
        .unwrap_or_else(|| NO_REPLY.to_string()))
}
