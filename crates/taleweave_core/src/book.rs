//! Book document types.

use crate::{now_millis, Plan, StoryState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-text authoring configuration for a book.
///
/// Everything here is prose the reader typed; the engine never interprets it,
/// it only threads it into prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookConfig {
    /// First source-book title the story should take after
    #[serde(default)]
    pub title_a: String,
    /// Second source-book title the story should take after
    #[serde(default)]
    pub title_b: String,
    /// World description
    #[serde(default)]
    pub world: String,
    /// Main character description
    #[serde(default)]
    pub main_character: String,
    /// Genre
    #[serde(default)]
    pub genre: String,
}

/// A single narrative under authoring; the unit of ownership and coordination.
///
/// # Examples
///
/// ```
/// use taleweave_core::Book;
///
/// let book = Book::new("user-1");
/// assert_eq!(book.owner, "user-1");
/// assert!(book.plan.is_none());
/// assert!(!book.plan_updating);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Document id
    pub id: String,
    /// Owner user id, resolved by the auth layer
    pub owner: String,
    /// Free-text authoring configuration
    #[serde(default)]
    pub config: BookConfig,
    /// Creation time, unix milliseconds
    pub created_at: i64,
    /// Last mutation time, unix milliseconds
    pub updated_at: i64,
    /// Narrative outline, created lazily on first generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    /// Committed pages plus the branch cache, created on first commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<StoryState>,
    /// True while a background plan adaptation is replacing [`Book::plan`];
    /// new generations are refused for the book until it clears
    #[serde(default)]
    pub plan_updating: bool,
}

impl Book {
    /// Create an empty book owned by `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.into(),
            config: BookConfig::default(),
            created_at: now,
            updated_at: now,
            plan: None,
            story: None,
            plan_updating: false,
        }
    }

    /// Index of the most recently committed page, `-1` before the first.
    pub fn head_index(&self) -> i64 {
        self.story.as_ref().map_or(-1, |s| s.index)
    }
}
