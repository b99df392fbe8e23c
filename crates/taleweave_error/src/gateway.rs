//! LLM gateway error types.

/// Specific error conditions for chat gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GatewayErrorKind {
    /// Request never produced an HTTP response
    #[display("Transport failure: {}", _0)]
    Transport(String),
    /// Upstream returned a non-success status
    #[display("Upstream HTTP {}: {}", status, message)]
    Http {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body, truncated by the caller if large
        message: String,
    },
    /// Caller requested structured output but the reply was not JSON
    #[display("Non-JSON reply from model: {}", _0)]
    NonJson(String),
    /// Response contained no choices or no message content
    #[display("Model response carried no content")]
    MissingContent,
}

/// Error type for LLM gateway operations.
///
/// # Examples
///
/// ```
/// use taleweave_error::{GatewayError, GatewayErrorKind};
///
/// let err = GatewayError::new(GatewayErrorKind::MissingContent);
/// assert!(format!("{}", err).contains("no content"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    /// The specific error condition
    pub kind: GatewayErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GatewayError {
    /// Create a new GatewayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a retry at the gateway level could plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        match &self.kind {
            GatewayErrorKind::Transport(_) => true,
            GatewayErrorKind::Http { status, .. } => *status == 429 || *status >= 500,
            GatewayErrorKind::NonJson(_) | GatewayErrorKind::MissingContent => false,
        }
    }
}
