//! Gateway configuration.

use taleweave_error::ConfigError;

/// Configuration for the OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Model used when a call does not override it
    pub default_model: String,
    /// Attempts per call beyond the first, spent only on retriable failures
    pub max_retries: usize,
    /// Per-request timeout in seconds; kept under the server idle timeout
    pub request_timeout_secs: u64,
}

impl GatewayConfig {
    /// Create a config with library defaults for retry and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gpt-4.1-mini".to_string(),
            max_retries: 2,
            request_timeout_secs: 240,
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `OPENAI_API_KEY` (required)
    /// - `OPENAI_BASE_URL` (default: `https://api.openai.com/v1`)
    /// - `OPENAI_MODEL` (default model, optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::new("OPENAI_API_KEY not set"))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.default_model = model;
        }
        Ok(config)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}
