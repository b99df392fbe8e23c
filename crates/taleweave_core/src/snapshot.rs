//! Read-only client projection of a book's story.

use crate::{Book, Page, Point};
use serde::{Deserialize, Serialize};

/// Plan projection attached to snapshots for debugging clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugPlan {
    /// Current point index
    pub cur_point: usize,
    /// Current sub-step index
    pub cur_sub: usize,
    /// Plan points with their substeps
    pub points: Vec<Point>,
}

/// Read-only story projection returned to clients.
///
/// Never carries the branch cache, pending claims, cache timestamps, or the
/// pending-verify record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySnapshot {
    /// Committed pages
    pub pages: Vec<Page>,
    /// Index of the most recently committed page, `-1` before the first
    pub index: i64,
    /// Memory notes
    pub notes: Vec<String>,
    /// Latest committed page's summary
    pub summary: String,
    /// Commit counter
    pub turn: u64,
    /// Plan projection, present when the book has a plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_plan: Option<DebugPlan>,
}

impl StorySnapshot {
    /// Project a book into its client-visible snapshot.
    pub fn project(book: &Book) -> Self {
        let debug_plan = book.plan.as_ref().map(|plan| DebugPlan {
            cur_point: plan.cur_point,
            cur_sub: plan.cur_sub,
            points: plan.points.clone(),
        });
        match &book.story {
            Some(story) => Self {
                pages: story.pages.clone(),
                index: story.index,
                notes: story.notes.clone(),
                summary: story.summary.clone(),
                turn: story.turn,
                debug_plan,
            },
            None => Self {
                index: -1,
                debug_plan,
                ..Self::default()
            },
        }
    }
}
