//! HTTP API server for the taleweave story engine.
//!
//! Thin transport over [`taleweave_runtime::StoryService`]: bearer-token
//! authentication resolves a user id, ownership is checked per book, and the
//! runtime's snapshots and readiness reports are serialized as JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod routes;
mod telemetry;

pub use auth::{BearerIdentityVerifier, TokenVerifier};
pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{router, AppState};
pub use telemetry::init_telemetry;
