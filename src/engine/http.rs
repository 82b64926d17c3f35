//! OpenAI-compatible HTTP backend.
//!
//! Speaks the `/chat/completions` shape, which most hosted and local
//! model servers accept. The base URL is injectable so tests can point
//! it at a wiremock server.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForsetiError, Result};

use super::remote::{BackendReply, TextBackend};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// Text backend over an OpenAI-compatible chat-completions endpoint.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Option<Duration>,
}

impl HttpBackend {
    /// Create a backend against the given base URL (e.g.
    /// `https://api.openai.com/v1`) with a fresh HTTP client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_client(base_url, api_key, model, reqwest::Client::new())
    }

    /// Create a backend sharing an existing HTTP client's connection pool.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: None,
        }
    }

    /// Advisory request timeout.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(Duration::from_millis(ms));
        self
    }
}

#[async_trait]
impl TextBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, system: &str, user: &str) -> Result<BackendReply> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => ForsetiError::QuotaExceeded { message },
                401 | 403 => ForsetiError::AuthenticationFailed,
                code => ForsetiError::Api { status: code, message },
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        debug!(model = %self.model, chars = text.len(), "backend reply received");
        Ok(BackendReply {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens),
        })
    }
}
