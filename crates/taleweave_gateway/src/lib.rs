//! LLM chat gateway for the taleweave story engine.
//!
//! This crate provides the single chat-call primitive the rest of the engine
//! builds on: messages in, text out, with per-call model and reasoning-effort
//! selection, bounded retry, and latency logging under a caller-supplied tag.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod openai;
mod options;

pub use config::GatewayConfig;
pub use openai::OpenAiGateway;
pub use options::{ChatOptions, ReasoningEffort, ResponseFormat};

use async_trait::async_trait;
use taleweave_core::ChatMessage;
use taleweave_error::TaleweaveResult;

/// Core trait every chat backend must implement.
///
/// Implementations are stateless and re-entrant: multiple chats may be in
/// flight concurrently on one client.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send one chat-completion request and return the first choice's text.
    async fn chat(&self, messages: &[ChatMessage], opts: &ChatOptions) -> TaleweaveResult<String>;
}
