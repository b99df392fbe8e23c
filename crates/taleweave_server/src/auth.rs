//! Bearer-token authentication seam.

use async_trait::async_trait;
use taleweave_error::{RequestError, RequestErrorKind};

/// Resolves a bearer token to a user id.
///
/// The production verifier (Firebase ID tokens) is an external collaborator
/// wired in at startup; everything behind this trait only ever sees the
/// resolved user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return the user id it belongs to.
    async fn verify(&self, token: &str) -> Result<String, RequestError>;
}

/// Development verifier: the token *is* the user id.
///
/// Keeps local setups and tests free of a credential round-trip while
/// exercising the same extraction and ownership paths as production.
#[derive(Debug, Clone, Default)]
pub struct BearerIdentityVerifier;

#[async_trait]
impl TokenVerifier for BearerIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<String, RequestError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RequestError::new(RequestErrorKind::Unauthorized(
                "empty bearer token".into(),
            )));
        }
        Ok(token.to_string())
    }
}
