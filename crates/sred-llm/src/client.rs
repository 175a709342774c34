//! OpenAI-compatible chat-completion client
//!
//! Implements [`LanguageModel`] over any endpoint speaking the
//! `/chat/completions` protocol. Errors are classified so the
//! generator's retry policy can branch: connection trouble, timeouts,
//! 429 and 5xx are transient; everything else is fatal.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sred_agents::{CompletionRequest, LanguageModel};
use sred_core::LlmError;
use std::time::Duration;

/// User-Agent for completion requests
const USER_AGENT: &str = concat!("sred-drafter/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionPayload<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Whether an HTTP status is worth retrying
fn status_is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Chat-completion client for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Create a client
    ///
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    ///
    /// # Errors
    /// - `LlmError::Fatal` if the HTTP client cannot be constructed
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::Fatal(e.to_string()))?;

        Ok(Self {
            http,
            completions_url: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let payload = ChatCompletionPayload {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    LlmError::Transient(e.to_string())
                } else {
                    LlmError::Fatal(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("status {status}: {body:.200}");
            return if status_is_transient(status) {
                Err(LlmError::Transient(message))
            } else {
                Err(LlmError::Fatal(message))
            };
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Fatal(format!("malformed completion body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::Fatal("completion carried no content".to_string()));
        }

        tracing::debug!(length = content.len(), "completion received");
        Ok(content.trim().to_string())
    }
}
