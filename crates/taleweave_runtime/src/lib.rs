//! Branch cache coordination and story runtime for the taleweave story
//! engine.
//!
//! The [`Coordinator`] owns the speculative-continuation protocol: claims,
//! takeover of abandoned work, staleness refresh, pruning on commit, and the
//! readiness contract clients poll. The [`StoryService`] is the thin API
//! layer above it: `start`, `snapshot`, `ready`, `next`, `choose`.
//!
//! No in-process locks are involved anywhere: coordination happens through
//! conditional updates on the book document, so several worker processes can
//! serve the same book and a crashed worker's claim is recovered by
//! staleness-based takeover.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod service;

pub use config::RuntimeConfig;
pub use coordinator::{Coordinator, Readiness};
pub use service::{ChooseRequest, StoryService};
