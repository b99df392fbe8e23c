//! Per-call chat options.

use serde::Serialize;

/// Reasoning effort hint forwarded to the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    /// Cheapest tier; the gateway default
    #[default]
    Low,
    /// Planner-grade effort
    Medium,
    /// Reserved for the hardest calls
    High,
}

/// Structured-output mode requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ResponseFormat {
    /// The provider must return a single JSON object
    #[serde(rename = "json_object")]
    JsonObject,
}

/// Options recognized by [`crate::ChatGateway::chat`].
///
/// # Examples
///
/// ```
/// use taleweave_gateway::{ChatOptions, ReasoningEffort, ResponseFormat};
///
/// let opts = ChatOptions::tagged("plan.points")
///     .with_effort(ReasoningEffort::Medium)
///     .with_response_format(ResponseFormat::JsonObject);
/// assert_eq!(opts.tag, "plan.points");
/// ```
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Model override; the gateway default applies when `None`
    pub model: Option<String>,
    /// Structured-output request; callers setting this treat non-JSON replies as errors
    pub response_format: Option<ResponseFormat>,
    /// Reasoning effort; `low` when unset
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Completion token ceiling
    pub max_completion_tokens: Option<u32>,
    /// Log tag identifying the calling subsystem
    pub tag: &'static str,
}

impl ChatOptions {
    /// Options with only the log tag set.
    pub fn tagged(tag: &'static str) -> Self {
        Self {
            model: None,
            response_format: None,
            reasoning_effort: None,
            max_completion_tokens: None,
            tag,
        }
    }

    /// Set the model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set an optional model override, keeping the default when `None`.
    pub fn with_model_opt(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Set the reasoning effort.
    pub fn with_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    /// Request structured output.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Set the completion token ceiling.
    pub fn with_max_completion_tokens(mut self, max: u32) -> Self {
        self.max_completion_tokens = Some(max);
        self
    }
}
