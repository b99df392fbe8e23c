//! Story state: committed pages, memory notes, and the branch cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committed chapter of prose, optionally offering up to three choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Prose, six to eight short paragraphs
    pub passage: String,
    /// One-line recap of this page
    pub summary: String,
    /// Exactly three short choice texts when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Stable ids parallel to `options`, emitted at commit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_ids: Option<Vec<String>>,
}

/// Identifies the sub-step a candidate page was generated under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubToCheck {
    /// Point index in the plan at generation time
    pub point_index: usize,
    /// Sub-step index within the point
    pub sub_index: usize,
    /// The sub-step text the prompt carried
    pub text: String,
}

/// A speculatively generated page held in the branch cache until consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated page
    pub page: Page,
    /// Up to two new memory-note bullets
    #[serde(default)]
    pub notes_delta: Vec<String>,
    /// Present when the page was generated under a sub-step focus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_to_check: Option<SubToCheck>,
}

/// Deferred verification record written at commit time.
///
/// Consumed (and cleared unconditionally) immediately before the next page
/// generation for the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVerify {
    /// The committed passage to check
    pub passage: String,
    /// The sub-step text it was meant to dramatize
    pub sub_text: String,
    /// Point index at generation time
    pub point_index: usize,
    /// Sub-step index at generation time
    pub sub_index: usize,
}

/// Committed pages plus the speculative branch cache for one book.
///
/// `index = -1` means "before the first page". Branch cache maps are keyed by
/// the string form of [`crate::BranchKey`]; `branch_cache_at` carries the
/// write timestamp of each entry and `branch_pending` the claim timestamp of
/// any in-flight generation, both unix milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryState {
    /// Committed pages, append-only in the forward direction
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Index of the most recently committed page, `-1` before the first
    pub index: i64,
    /// Deduplicated ordered list of short factual bullets
    #[serde(default)]
    pub notes: Vec<String>,
    /// Latest committed page's summary
    #[serde(default)]
    pub summary: String,
    /// Commit counter
    #[serde(default)]
    pub turn: u64,
    /// Speculative continuations keyed by branch key
    #[serde(default)]
    pub branch_cache: BTreeMap<String, Candidate>,
    /// Last write time per branch key
    #[serde(default)]
    pub branch_cache_at: BTreeMap<String, i64>,
    /// Claim time per branch key with a generation in flight
    #[serde(default)]
    pub branch_pending: BTreeMap<String, i64>,
    /// Deferred verification record, at most one per book
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_verify: Option<PendingVerify>,
}

impl StoryState {
    /// Fresh state with no pages committed.
    pub fn empty() -> Self {
        Self {
            index: -1,
            ..Self::default()
        }
    }

    /// The committed page at `index`, when in range.
    pub fn page_at(&self, index: i64) -> Option<&Page> {
        usize::try_from(index).ok().and_then(|i| self.pages.get(i))
    }

    /// Merge a candidate's notes delta, preserving insertion order and
    /// dropping duplicates and blanks.
    pub fn merge_notes(&mut self, delta: &[String]) {
        for note in delta {
            let trimmed = note.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !self.notes.iter().any(|n| n == trimmed) {
                self.notes.push(trimmed.to_string());
            }
        }
    }
}
