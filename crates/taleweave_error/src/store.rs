//! Document store error types.

/// Specific error conditions for document store operations.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StoreErrorKind {
    /// Document with the given id does not exist
    #[display("Document not found: {}", _0)]
    NotFound(String),
    /// Document could not be serialized or deserialized
    #[display("Document codec failure: {}", _0)]
    Codec(String),
    /// Backend refused or failed the operation
    #[display("Store backend failure: {}", _0)]
    Backend(String),
}

/// Error type for document store operations.
///
/// # Examples
///
/// ```
/// use taleweave_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("b-123".into()));
/// assert!(format!("{}", err).contains("b-123"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The specific error condition
    pub kind: StoreErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
