//! Error types for the taleweave story engine.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use taleweave_error::{TaleweaveResult, GatewayError, GatewayErrorKind};
//!
//! fn call_model() -> TaleweaveResult<String> {
//!     Err(GatewayError::new(GatewayErrorKind::Transport("connection refused".into())))?
//! }
//!
//! assert!(call_model().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
mod request;
mod schema;
mod store;
mod timeout;

pub use config::ConfigError;
pub use error::{TaleweaveError, TaleweaveErrorKind, TaleweaveResult};
pub use gateway::{GatewayError, GatewayErrorKind};
pub use request::{RequestError, RequestErrorKind};
pub use schema::{SchemaError, SchemaErrorKind};
pub use store::{StoreError, StoreErrorKind};
pub use timeout::TimeoutError;
