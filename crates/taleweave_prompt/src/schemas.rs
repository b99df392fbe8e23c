//! Response schemas the prompts ask the model to obey.
//!
//! Each schema owns its validation: the raw deserialized shape is checked and
//! normalized before the engine touches it.

use serde::Deserialize;
use taleweave_core::{Plan, Point};
use taleweave_error::{SchemaError, SchemaErrorKind};

/// Planner reply: idea, conflict, and major points without substeps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDraft {
    /// One-paragraph story idea
    pub overall_idea: String,
    /// Central conflict
    pub conflict: String,
    /// Major points, titles plus briefs
    pub points: Vec<PointDraft>,
}

/// One planner point before substep expansion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDraft {
    /// Short point title
    pub title: String,
    /// What the point covers
    pub brief: String,
}

impl PlannerDraft {
    /// Drop blank points and require at least three to survive.
    pub fn validate(mut self) -> Result<Self, SchemaError> {
        self.points
            .retain(|p| !p.title.trim().is_empty() && !p.brief.trim().is_empty());
        if self.points.len() < 3 {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "points",
                reason: format!("{} usable points, need at least 3", self.points.len()),
            }));
        }
        Ok(self)
    }
}

/// Batched substep reply, shared by expansion and intro insertion.
#[derive(Debug, Clone, Deserialize)]
pub struct SubstepBatch {
    /// Per-point substep lists
    #[serde(default)]
    pub items: Vec<SubstepItem>,
}

/// Substeps proposed for the point at `index`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubstepItem {
    /// Point index the substeps belong to
    pub index: usize,
    /// Proposed substeps, in dramatization order
    #[serde(default)]
    pub substeps: Vec<String>,
}

impl SubstepBatch {
    /// Non-blank substeps for `index`, when the batch carries any.
    pub fn substeps_for(&self, index: usize) -> Option<Vec<String>> {
        let item = self.items.iter().find(|item| item.index == index)?;
        let substeps: Vec<String> = item
            .substeps
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        (!substeps.is_empty()).then_some(substeps)
    }
}

/// Page generation reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDraft {
    /// Prose, six to eight short paragraphs
    #[serde(default)]
    pub passage: String,
    /// One-line recap
    #[serde(default)]
    pub summary: String,
    /// New memory-note bullets
    #[serde(default)]
    pub notes: Vec<String>,
    /// Choice texts; honored only when requested and exactly three long
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

impl PageDraft {
    /// Require a passage; normalize notes to at most two non-empty bullets and
    /// coerce options per the caller's request.
    pub fn validate(mut self, allow_options: bool) -> Result<Self, SchemaError> {
        if self.passage.trim().is_empty() {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "passage",
                reason: "empty".into(),
            }));
        }
        self.notes = self
            .notes
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .take(2)
            .collect();
        self.options = match self.options {
            Some(options) if allow_options && options.len() == 3 => Some(options),
            _ => None,
        };
        Ok(self)
    }
}

/// Verifier reply.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierVerdict {
    /// Whether the passage accomplished the sub-step
    pub done: bool,
}

/// Plan adaptation reply: a full replacement plan with its cursor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRevision {
    /// Revised story idea
    pub overall_idea: String,
    /// Revised conflict
    pub conflict: String,
    /// Revised points with substeps
    pub points: Vec<RevisedPoint>,
    /// Cursor point index into the revised plan
    pub cur_point: usize,
    /// Cursor sub-step index into the revised plan
    pub cur_sub: usize,
}

/// One revised point, substeps included.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisedPoint {
    /// Short point title
    pub title: String,
    /// What the point covers
    pub brief: String,
    /// Dramatization substeps
    #[serde(default)]
    pub substeps: Vec<String>,
}

impl PlanRevision {
    /// Validate the revision: at least three usable points, every point with
    /// at least one substep, cursor in range.
    pub fn validate(self) -> Result<Self, SchemaError> {
        let points: Vec<&RevisedPoint> = self
            .points
            .iter()
            .filter(|p| !p.title.trim().is_empty())
            .collect();
        if points.len() < 3 {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "points",
                reason: format!("{} usable points, need at least 3", points.len()),
            }));
        }
        if self.points.iter().any(|p| p.substeps.is_empty()) {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "substeps",
                reason: "every point needs at least one substep".into(),
            }));
        }
        let as_points: Vec<Point> = self.points.iter().map(RevisedPoint::to_point).collect();
        if !Plan::cursor_in_range(&as_points, self.cur_point, self.cur_sub) {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "curPoint",
                reason: format!("cursor ({}, {}) out of range", self.cur_point, self.cur_sub),
            }));
        }
        Ok(self)
    }
}

impl RevisedPoint {
    /// Convert into the core plan point type.
    pub fn to_point(&self) -> Point {
        Point {
            title: self.title.clone(),
            brief: self.brief.clone(),
            substeps: self.substeps.clone(),
        }
    }
}
