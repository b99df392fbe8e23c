//! Route handlers.

use crate::{ApiError, TokenVerifier};
use axum::extract::{Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use taleweave_core::{Book, BookConfig, StorySnapshot};
use taleweave_error::{RequestError, RequestErrorKind};
use taleweave_runtime::{ChooseRequest, Readiness, StoryService};
use tracing::instrument;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The story runtime
    pub service: StoryService,
    /// Bearer-token verifier
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Assemble the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/books", post(create_book))
        .route("/api/books/:id", get(get_book).put(update_book))
        .route("/api/books/:id/story", get(get_story))
        .route("/api/books/:id/story/start", post(start_story))
        .route("/api/books/:id/story/ready", get(story_ready))
        .route("/api/books/:id/story/next", post(story_next))
        .route("/api/books/:id/story/choose", post(story_choose))
        .with_state(state)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            RequestError::new(RequestErrorKind::Unauthorized("missing bearer token".into()))
        })?;
    Ok(state.verifier.verify(token).await?)
}

/// Load a book and check the caller owns it.
async fn owned_book(state: &AppState, headers: &HeaderMap, id: &str) -> Result<Book, ApiError> {
    let user = authenticate(state, headers).await?;
    let book = state
        .service
        .repo()
        .find(id)
        .await?
        .ok_or_else(|| RequestError::not_found(format!("book {id}")))?;
    if book.owner != user {
        return Err(RequestError::new(RequestErrorKind::Forbidden(
            "book belongs to another user".into(),
        ))
        .into());
    }
    Ok(book)
}

#[instrument(skip_all)]
async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let book = state.service.repo().create(&user).await?;
    Ok(Json(json!({ "id": book.id })))
}

#[instrument(skip_all, fields(book = %id))]
async fn update_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(config): Json<BookConfig>,
) -> Result<Json<Book>, ApiError> {
    owned_book(&state, &headers, &id).await?;
    state.service.repo().update_config(&id, &config).await?;
    let book = state
        .service
        .repo()
        .find(&id)
        .await?
        .ok_or_else(|| RequestError::not_found(format!("book {id}")))?;
    Ok(Json(book))
}

#[instrument(skip_all, fields(book = %id))]
async fn get_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = owned_book(&state, &headers, &id).await?;
    Ok(Json(book))
}

#[instrument(skip_all, fields(book = %id))]
async fn get_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<StorySnapshot>, ApiError> {
    let book = owned_book(&state, &headers, &id).await?;
    // No pages yet: starting transparently keeps first-load UIs to one call.
    let snapshot = if book.story.as_ref().is_some_and(|s| !s.pages.is_empty()) {
        state.service.snapshot(&id).await?
    } else {
        state.service.start(&id).await?
    };
    Ok(Json(snapshot))
}

#[instrument(skip_all, fields(book = %id))]
async fn start_story(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<StorySnapshot>, ApiError> {
    owned_book(&state, &headers, &id).await?;
    Ok(Json(state.service.start(&id).await?))
}

#[derive(Debug, Deserialize)]
struct ReadyParams {
    index: i64,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    ready: Readiness,
}

#[instrument(skip_all, fields(book = %id, index = params.index))]
async fn story_ready(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<ReadyParams>,
) -> Result<Json<ReadyResponse>, ApiError> {
    owned_book(&state, &headers, &id).await?;
    let ready = state.service.ready(&id, params.index).await?;
    Ok(Json(ReadyResponse { ready }))
}

#[derive(Debug, Deserialize)]
struct NextBody {
    index: i64,
}

#[instrument(skip_all, fields(book = %id, index = body.index))]
async fn story_next(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<NextBody>,
) -> Result<Json<StorySnapshot>, ApiError> {
    owned_book(&state, &headers, &id).await?;
    Ok(Json(state.service.next(&id, body.index).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChooseBody {
    index: i64,
    option_id: Option<String>,
    text: Option<String>,
}

#[instrument(skip_all, fields(book = %id, index = body.index))]
async fn story_choose(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ChooseBody>,
) -> Result<Json<StorySnapshot>, ApiError> {
    owned_book(&state, &headers, &id).await?;
    let request = ChooseRequest {
        index: body.index,
        option_id: body.option_id,
        text: body.text,
    };
    Ok(Json(state.service.choose(&id, &request).await?))
}
