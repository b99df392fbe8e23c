//! Error-to-status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use taleweave_error::{RequestErrorKind, TaleweaveError, TaleweaveErrorKind};

/// Transport wrapper turning engine errors into HTTP responses.
///
/// Background tasks never reach this type: only foreground handlers surface
/// errors, and the mapping is fixed by the API contract (400 validation, 401
/// unauthenticated, 403 ownership, 404 missing book, 408 readiness timeout,
/// 500 generation failure).
#[derive(Debug)]
pub struct ApiError(TaleweaveError);

impl<E> From<E> for ApiError
where
    E: Into<TaleweaveError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            TaleweaveErrorKind::Request(err) => match &err.kind {
                RequestErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
                RequestErrorKind::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                RequestErrorKind::Forbidden(_) => StatusCode::FORBIDDEN,
                RequestErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                RequestErrorKind::Conflict(_) => StatusCode::CONFLICT,
            },
            TaleweaveErrorKind::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            TaleweaveErrorKind::Store(err) => match &err.kind {
                taleweave_error::StoreErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            TaleweaveErrorKind::Gateway(_)
            | TaleweaveErrorKind::Schema(_)
            | TaleweaveErrorKind::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": format!("{}", self.0) }));
        (status, body).into_response()
    }
}
