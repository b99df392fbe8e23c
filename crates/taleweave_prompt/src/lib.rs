//! Prompt builders and response schemas for the taleweave story engine.
//!
//! Everything here is pure: builders assemble chat messages from a
//! configuration snapshot and a task payload, and schema types validate the
//! model's reply on receipt. No I/O happens in this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builders;
mod extract;
mod schemas;

pub use builders::{
    adapt_messages, intro_insert_messages, page_messages, planner_messages, substep_messages,
    verifier_messages, Focus, PagePrompt,
};
pub use extract::{extract_json, parse_reply};
pub use schemas::{
    PageDraft, PlanRevision, PlannerDraft, PointDraft, RevisedPoint, SubstepBatch, SubstepItem,
    VerifierVerdict,
};
