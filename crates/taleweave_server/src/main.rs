//! Server entry point.

use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use taleweave_engine::{ModelSelection, PageGenerator, PlanEngine, Verifier};
use taleweave_gateway::OpenAiGateway;
use taleweave_runtime::{Coordinator, RuntimeConfig, StoryService};
use taleweave_server::{init_telemetry, router, AppState, BearerIdentityVerifier, ServerConfig};
use taleweave_store::{BookRepository, MemoryStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry();

    let config = ServerConfig::from_env();
    info!(port = config.port, "starting taleweave server");

    let gateway = Arc::new(OpenAiGateway::from_env()?);

    // The production deployment plugs a document-store binding for
    // `config.mongo_url` in here; the in-process store serves single-node
    // setups and keeps the coordination semantics identical.
    warn!(
        mongo_url = %config.mongo_url,
        mongo_db = %config.mongo_db,
        "using in-process document store; book state does not survive restarts"
    );
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
    let service = StoryService::new(repo, coordinator, plan_engine, generator, verifier);

    let state = AppState {
        service,
        verifier: Arc::new(BearerIdentityVerifier),
    };

    let cors = if config.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    };

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Readiness polls legitimately block for minutes; the request
        // timeout sits above the coordinator's wait ceiling.
        .layer(TimeoutLayer::new(Duration::from_secs(config.idle_timeout_secs)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
