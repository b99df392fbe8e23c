//! Core data types for the taleweave story engine.
//!
//! This crate provides the domain model shared across the workspace: books,
//! narrative plans, story state, speculative page candidates, branch cache
//! keys, and the chat message types the gateway speaks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod branch;
mod chat;
mod option_id;
mod plan;
mod snapshot;
mod story;

pub use book::{Book, BookConfig};
pub use branch::{Branch, BranchKey};
pub use chat::{ChatMessage, ChatRole};
pub use option_id::make_option_id;
pub use plan::{Plan, Point};
pub use snapshot::{DebugPlan, StorySnapshot};
pub use story::{Candidate, Page, PendingVerify, StoryState, SubToCheck};

/// Current wall-clock time as unix milliseconds.
///
/// All persisted timestamps (cache writes, pending claims, book audit fields)
/// use this representation so conditional updates can compare them exactly.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
