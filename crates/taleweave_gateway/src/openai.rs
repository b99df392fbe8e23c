//! OpenAI-compatible chat-completions client.

use crate::{ChatGateway, ChatOptions, GatewayConfig, ReasoningEffort, ResponseFormat};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use taleweave_core::ChatMessage;
use taleweave_error::{GatewayError, GatewayErrorKind, TaleweaveResult};
use tracing::{debug, error, info, instrument, warn};

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// The client is cheap to clone and safe to share; every call builds its own
/// request so concurrent chats never contend.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: Client,
    config: GatewayConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    reasoning_effort: ReasoningEffort,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGateway {
    /// Create a gateway from the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::new(GatewayErrorKind::Transport(format!(
                    "failed to build HTTP client: {e}"
                )))
            })?;
        Ok(Self { client, config })
    }

    /// Create a gateway from environment variables.
    pub fn from_env() -> TaleweaveResult<Self> {
        let config = GatewayConfig::from_env()?;
        Ok(Self::new(config)?)
    }

    async fn send_once(
        &self,
        messages: &[ChatMessage],
        opts: &ChatOptions,
    ) -> Result<String, GatewayError> {
        let model = opts.model.as_deref().unwrap_or(&self.config.default_model);
        let body = ChatCompletionRequest {
            model,
            messages,
            response_format: opts.response_format,
            reasoning_effort: opts.reasoning_effort.unwrap_or_default(),
            max_completion_tokens: opts.max_completion_tokens,
        };
        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(tag = opts.tag, error = %e, "chat request failed to send");
                GatewayError::new(GatewayErrorKind::Transport(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(tag = opts.tag, status = %status, body = %message, "chat endpoint returned error");
            return Err(GatewayError::new(GatewayErrorKind::Http {
                status: status.as_u16(),
                message,
            }));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(tag = opts.tag, error = %e, "failed to parse chat response envelope");
            GatewayError::new(GatewayErrorKind::Transport(format!(
                "response decode failure: {e}"
            )))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GatewayError::new(GatewayErrorKind::MissingContent))
    }
}

#[async_trait]
impl ChatGateway for OpenAiGateway {
    #[instrument(skip(self, messages), fields(tag = opts.tag))]
    async fn chat(&self, messages: &[ChatMessage], opts: &ChatOptions) -> TaleweaveResult<String> {
        let prompt_chars: usize = messages.iter().map(|m| m.content.len()).sum();
        debug!(
            tag = opts.tag,
            messages = messages.len(),
            prompt_chars,
            model = opts.model.as_deref().unwrap_or(&self.config.default_model),
            "sending chat request"
        );

        let started = Instant::now();
        let mut attempt = 0;
        let text = loop {
            match self.send_once(messages, opts).await {
                Ok(text) => break text,
                Err(err) if err.is_retriable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(500 * attempt as u64);
                    warn!(
                        tag = opts.tag,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "retrying chat request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            tag = opts.tag,
            latency_ms = started.elapsed().as_millis() as u64,
            prompt_chars,
            reply_chars = text.len(),
            retries = attempt,
            "chat request completed"
        );
        Ok(text)
    }
}
