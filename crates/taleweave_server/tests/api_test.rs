//! Transport-level tests: authentication, ownership, status mapping.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use taleweave_core::ChatMessage;
use taleweave_engine::{ModelSelection, PageGenerator, PlanEngine, Verifier};
use taleweave_error::{GatewayError, GatewayErrorKind, TaleweaveResult};
use taleweave_gateway::{ChatGateway, ChatOptions};
use taleweave_runtime::{Coordinator, RuntimeConfig, StoryService};
use taleweave_server::{router, AppState, BearerIdentityVerifier};
use taleweave_store::{BookRepository, MemoryStore};
use tower::ServiceExt;

/// Gateway that refuses every call; these tests never reach generation.
struct OfflineGateway;

#[async_trait]
impl ChatGateway for OfflineGateway {
    async fn chat(&self, _messages: &[ChatMessage], _opts: &ChatOptions) -> TaleweaveResult<String> {
        Err(GatewayError::new(GatewayErrorKind::Transport("offline".into())).into())
    }
}

fn app() -> (axum::Router, BookRepository) {
    let gateway: Arc<dyn ChatGateway> = Arc::new(OfflineGateway);
    let repo = BookRepository::new(Arc::new(MemoryStore::new()));
    let models = ModelSelection::gateway_default();
    let plan_engine = PlanEngine::new(gateway.clone(), repo.clone(), models.clone());
    let generator = PageGenerator::new(gateway.clone(), models.clone());
    let verifier = Verifier::new(gateway.clone(), repo.clone(), models);
    let coordinator = Coordinator::new(
        repo.clone(),
        plan_engine.clone(),
        generator.clone(),
        verifier.clone(),
        RuntimeConfig::default(),
    );
    let service = StoryService::new(repo.clone(), coordinator, plan_engine, generator, verifier);
    let state = AppState {
        service,
        verifier: Arc::new(BearerIdentityVerifier),
    };
    (router(state), repo)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _repo) = app();
    let response = app
        .oneshot(
            Request::post("/api/books")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_fetch_book() {
    let (app, _repo) = app();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/books")
                .header("Authorization", "Bearer user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get(format!("/api/books/{id}"))
                .header("Authorization", "Bearer user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["owner"], "user-1");
}

#[tokio::test]
async fn update_config_round_trips() {
    let (app, repo) = app();
    let book = repo.create("user-1").await.unwrap();

    let response = app
        .oneshot(
            Request::put(format!("/api/books/{}", book.id))
                .header("Authorization", "Bearer user-1")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"titleA":"Alpha","titleB":"Beta","world":"isles","mainCharacter":"Mira","genre":"adventure"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["config"]["world"], "isles");

    let stored = repo.load(&book.id).await.unwrap();
    assert_eq!(stored.config.main_character, "Mira");
}

#[tokio::test]
async fn other_users_books_are_forbidden() {
    let (app, repo) = app();
    let book = repo.create("owner-a").await.unwrap();

    let response = app
        .oneshot(
            Request::get(format!("/api/books/{}", book.id))
                .header("Authorization", "Bearer owner-b")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let (app, _repo) = app();
    let response = app
        .oneshot(
            Request::get("/api/books/no-such-book")
                .header("Authorization", "Bearer user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ready_rejects_out_of_range_index() {
    let (app, repo) = app();
    let book = repo.create("user-1").await.unwrap();
    repo.init_story_if_absent(&book.id).await.unwrap();

    let response = app
        .oneshot(
            Request::get(format!("/api/books/{}/story/ready?index=9", book.id))
                .header("Authorization", "Bearer user-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn choose_without_resolvable_choice_is_bad_request() {
    let (app, repo) = app();
    let book = repo.create("user-1").await.unwrap();
    repo.init_story_if_absent(&book.id).await.unwrap();

    let response = app
        .oneshot(
            Request::post(format!("/api/books/{}/story/choose", book.id))
                .header("Authorization", "Bearer user-1")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"index":0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
