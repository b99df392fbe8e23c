//! Client request error types.

/// Specific error conditions for client-facing request validation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RequestErrorKind {
    /// Request shape or arguments failed validation
    #[display("Bad request: {}", _0)]
    BadRequest(String),
    /// No usable bearer token was supplied
    #[display("Unauthorized: {}", _0)]
    Unauthorized(String),
    /// Authenticated user does not own the target book
    #[display("Forbidden: {}", _0)]
    Forbidden(String),
    /// Target book does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// A conditional update lost its race and retries were exhausted
    #[display("Conflict: {}", _0)]
    Conflict(String),
}

/// Error type for client request validation.
///
/// # Examples
///
/// ```
/// use taleweave_error::{RequestError, RequestErrorKind};
///
/// let err = RequestError::new(RequestErrorKind::BadRequest("index out of range".into()));
/// assert!(format!("{}", err).contains("index"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Request Error: {} at line {} in {}", kind, line, file)]
pub struct RequestError {
    /// The specific error condition
    pub kind: RequestErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl RequestError {
    /// Create a new RequestError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RequestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a [`RequestErrorKind::BadRequest`] error.
    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::BadRequest(message.into()))
    }

    /// Shorthand for a [`RequestErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RequestErrorKind::NotFound(message.into()))
    }
}
