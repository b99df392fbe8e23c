//! Readiness wait timeout.

/// Raised when a readiness wait exceeds the configured ceiling.
///
/// # Examples
///
/// ```
/// use taleweave_error::TimeoutError;
///
/// let err = TimeoutError::new(240_000);
/// assert!(format!("{}", err).contains("240000"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Timeout Error: waited {}ms at line {} in {}", waited_ms, line, file)]
pub struct TimeoutError {
    /// How long the caller waited before giving up
    pub waited_ms: u64,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TimeoutError {
    /// Create a new TimeoutError with automatic location tracking.
    #[track_caller]
    pub fn new(waited_ms: u64) -> Self {
        let location = std::panic::Location::caller();
        Self {
            waited_ms,
            line: location.line(),
            file: location.file(),
        }
    }
}
