//! Top-level error wrapper types.

use crate::{ConfigError, GatewayError, RequestError, SchemaError, StoreError, TimeoutError};

/// The foundation error enum for the taleweave workspace.
///
/// # Examples
///
/// ```
/// use taleweave_error::{TaleweaveError, GatewayError, GatewayErrorKind};
///
/// let gw = GatewayError::new(GatewayErrorKind::MissingContent);
/// let err: TaleweaveError = gw.into();
/// assert!(format!("{}", err).contains("Gateway"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TaleweaveErrorKind {
    /// LLM gateway error
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Model output failed schema validation
    #[from(SchemaError)]
    Schema(SchemaError),
    /// Document store error
    #[from(StoreError)]
    Store(StoreError),
    /// Client request validation error
    #[from(RequestError)]
    Request(RequestError),
    /// Readiness wait exceeded its ceiling
    #[from(TimeoutError)]
    Timeout(TimeoutError),
    /// Process configuration missing or malformed
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Taleweave error with kind discrimination.
///
/// # Examples
///
/// ```
/// use taleweave_error::{TaleweaveResult, RequestError};
///
/// fn might_fail() -> TaleweaveResult<()> {
///     Err(RequestError::bad_request("missing index"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Taleweave Error: {}", _0)]
pub struct TaleweaveError(Box<TaleweaveErrorKind>);

impl TaleweaveError {
    /// Create a new error from a kind.
    pub fn new(kind: TaleweaveErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TaleweaveErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to TaleweaveErrorKind
impl<T> From<T> for TaleweaveError
where
    T: Into<TaleweaveErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for taleweave operations.
pub type TaleweaveResult<T> = std::result::Result<T, TaleweaveError>;
