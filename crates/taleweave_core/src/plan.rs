//! Narrative plan: a moving cursor over points and sub-steps.

use serde::{Deserialize, Serialize};

/// One major plan point with its dramatization sub-steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// Short point title
    pub title: String,
    /// One-or-two-sentence brief of what the point covers
    pub brief: String,
    /// Ordered sub-steps; at least one once the plan is expanded
    #[serde(default)]
    pub substeps: Vec<String>,
}

/// High-level narrative outline the engine steers generation with.
///
/// The cursor `(cur_point, cur_sub)` identifies the next unperformed sub-step.
/// When `cur_point == points.len()` the plan is exhausted.
///
/// # Examples
///
/// ```
/// use taleweave_core::{Plan, Point};
///
/// let mut plan = Plan {
///     overall_idea: "idea".into(),
///     conflict: "conflict".into(),
///     points: vec![Point {
///         title: "Setup".into(),
///         brief: "opening".into(),
///         substeps: vec!["meet the hero".into()],
///     }],
///     cur_point: 0,
///     cur_sub: 0,
/// };
/// plan.advance_cursor();
/// assert_eq!((plan.cur_point, plan.cur_sub), (1, 0));
/// assert!(plan.is_exhausted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// One-paragraph story idea
    pub overall_idea: String,
    /// Central conflict
    pub conflict: String,
    /// Ordered plan points, 6-9 at generation, at least 3 after adaptation
    pub points: Vec<Point>,
    /// Index of the current point; equals `points.len()` when exhausted
    pub cur_point: usize,
    /// Index of the next unperformed sub-step within the current point
    pub cur_sub: usize,
}

impl Plan {
    /// The sub-step the cursor currently designates, if any.
    pub fn current_substep(&self) -> Option<(usize, usize, &str)> {
        let point = self.points.get(self.cur_point)?;
        let text = point.substeps.get(self.cur_sub)?;
        Some((self.cur_point, self.cur_sub, text.as_str()))
    }

    /// Whether every point has been performed.
    pub fn is_exhausted(&self) -> bool {
        self.cur_point >= self.points.len()
    }

    /// Advance the cursor past the current sub-step.
    ///
    /// Rolls over to the next point when the current one is spent; never moves
    /// backward and saturates at the end of the plan.
    pub fn advance_cursor(&mut self) {
        let Some(point) = self.points.get(self.cur_point) else {
            return;
        };
        self.cur_sub += 1;
        if self.cur_sub >= point.substeps.len() {
            self.cur_point = (self.cur_point + 1).min(self.points.len());
            self.cur_sub = 0;
        }
    }

    /// How many sub-steps remain in the current point, counting the current one.
    ///
    /// `None` when the plan is exhausted or the current point has no substeps.
    pub fn remaining_in_point(&self) -> Option<usize> {
        let point = self.points.get(self.cur_point)?;
        let len = point.substeps.len();
        (self.cur_sub < len).then(|| len - self.cur_sub)
    }

    /// The point after the current one, when there is one.
    pub fn next_point(&self) -> Option<&Point> {
        self.points.get(self.cur_point + 1)
    }

    /// Whether a cursor position parsed from a model reply is in range.
    pub fn cursor_in_range(points: &[Point], cur_point: usize, cur_sub: usize) -> bool {
        if cur_point > points.len() {
            return false;
        }
        if cur_point == points.len() {
            return cur_sub == 0;
        }
        cur_sub < points[cur_point].substeps.len().max(1)
    }
}
