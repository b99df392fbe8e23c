//! Document store adapter and book repository for the taleweave story engine.
//!
//! Coordination in taleweave is not lock-based: every claim, takeover, and
//! prune is a conditional update against a single book document. This crate
//! defines the update language the engine requires from any backing store
//! ([`Filter`] / [`Update`] over dotted paths), the [`DocumentStore`] trait a
//! backend implements, an in-process [`MemoryStore`] used by tests and
//! single-node development, and the typed [`BookRepository`] exposing exactly
//! the atomic operations the branch cache coordinator needs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod memory;
mod repository;
mod store;

pub use document::{Cond, Filter, Op, Update};
pub use memory::MemoryStore;
pub use repository::{BookRepository, CommitFields};
pub use store::DocumentStore;
