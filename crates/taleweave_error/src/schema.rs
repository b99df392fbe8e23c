//! Schema validation error types for model output.

/// Specific error conditions when validating model output against a schema.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SchemaErrorKind {
    /// No JSON object could be extracted from the reply
    #[display("No JSON found in model reply ({} chars)", _0)]
    NoJson(usize),
    /// Extracted JSON failed to deserialize into the target shape
    #[display("Model reply did not match schema: {}", _0)]
    Mismatch(String),
    /// A required field was present but empty or out of range
    #[display("Invalid field '{}': {}", field, reason)]
    Invalid {
        /// Field name from the schema
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Error type for schema validation of model output.
///
/// # Examples
///
/// ```
/// use taleweave_error::{SchemaError, SchemaErrorKind};
///
/// let err = SchemaError::new(SchemaErrorKind::NoJson(42));
/// assert!(format!("{}", err).contains("No JSON"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Schema Error: {} at line {} in {}", kind, line, file)]
pub struct SchemaError {
    /// The specific error condition
    pub kind: SchemaErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SchemaError {
    /// Create a new SchemaError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SchemaErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
