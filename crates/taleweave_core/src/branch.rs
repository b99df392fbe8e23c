//! Branch cache keys.

use std::fmt;
use std::str::FromStr;

/// The linear "advance without a choice" continuation marker.
pub const NEXT_BRANCH: &str = "__next__";

/// Which continuation a branch key addresses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Branch {
    /// Linear continuation
    Next,
    /// Continuation for a specific option id
    Option(String),
}

/// Cache key of a speculative continuation.
///
/// A key at index `i` produces page `i + 1`. The string form is
/// `"${index}:__next__"` or `"${index}:${optionId}"`.
///
/// # Examples
///
/// ```
/// use taleweave_core::{Branch, BranchKey};
///
/// let key = BranchKey::next(0);
/// assert_eq!(key.to_string(), "0:__next__");
///
/// let key: BranchKey = "3:3-1a2b3c4d".parse().unwrap();
/// assert_eq!(key.index, 3);
/// assert_eq!(key.branch, Branch::Option("3-1a2b3c4d".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchKey {
    /// Index of the page this continuation starts from
    pub index: i64,
    /// Which continuation
    pub branch: Branch,
}

impl BranchKey {
    /// Linear continuation key for `index`.
    pub fn next(index: i64) -> Self {
        Self {
            index,
            branch: Branch::Next,
        }
    }

    /// Option continuation key for `index`.
    pub fn option(index: i64, option_id: impl Into<String>) -> Self {
        Self {
            index,
            branch: Branch::Option(option_id.into()),
        }
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Branch::Next => write!(f, "{}:{}", self.index, NEXT_BRANCH),
            Branch::Option(id) => write!(f, "{}:{}", self.index, id),
        }
    }
}

impl FromStr for BranchKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, branch) = s
            .split_once(':')
            .ok_or_else(|| format!("branch key without separator: {s}"))?;
        let index: i64 = index
            .parse()
            .map_err(|_| format!("branch key with non-numeric index: {s}"))?;
        let branch = if branch == NEXT_BRANCH {
            Branch::Next
        } else if branch.is_empty() {
            return Err(format!("branch key with empty branch: {s}"));
        } else {
            Branch::Option(branch.to_string())
        };
        Ok(Self { index, branch })
    }
}
