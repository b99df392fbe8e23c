//! Filters and updates over dotted document paths.

use serde_json::Value;

/// One condition on a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// Field presence or absence
    Exists(bool),
    /// Exact equality
    Eq(Value),
    /// Numeric `≤`, used for timestamp staleness checks
    Lte(i64),
}

/// Conjunction of field conditions, addressed by dotted paths.
///
/// Path segments are object keys; dynamic map keys (branch keys, option ids)
/// are plain segments since they never contain dots.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taleweave_store::Filter;
///
/// let doc = json!({"story": {"branchPending": {"0:__next__": 42}}});
/// let filter = Filter::new().eq("story.branchPending.0:__next__", json!(42));
/// assert!(filter.matches(&doc));
/// assert!(!Filter::new().exists("story.branchCache.0:__next__", true).matches(&doc));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conds: Vec<(String, Cond)>,
}

impl Filter {
    /// Empty filter; matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `path` to exist (or not).
    pub fn exists(mut self, path: impl Into<String>, present: bool) -> Self {
        self.conds.push((path.into(), Cond::Exists(present)));
        self
    }

    /// Require `path` to equal `value` exactly.
    pub fn eq(mut self, path: impl Into<String>, value: Value) -> Self {
        self.conds.push((path.into(), Cond::Eq(value)));
        self
    }

    /// Require `path` to be a number `≤ bound`. Absent fields do not match.
    pub fn lte(mut self, path: impl Into<String>, bound: i64) -> Self {
        self.conds.push((path.into(), Cond::Lte(bound)));
        self
    }

    /// Evaluate the conjunction against a document.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conds.iter().all(|(path, cond)| {
            let field = get_path(doc, path);
            match cond {
                Cond::Exists(present) => field.is_some() == *present,
                Cond::Eq(value) => field == Some(value),
                Cond::Lte(bound) => field
                    .and_then(Value::as_i64)
                    .is_some_and(|v| v <= *bound),
            }
        })
    }
}

/// One mutation of a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Write `value` at the path, creating parent objects as needed
    Set(Value),
    /// Remove the path if present
    Unset,
}

/// Ordered list of mutations, addressed by dotted paths.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use taleweave_store::Update;
///
/// let mut doc = json!({});
/// Update::new()
///     .set("story.branchPending.3:__next__", json!(7))
///     .apply(&mut doc);
/// assert_eq!(doc["story"]["branchPending"]["3:__next__"], 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(String, Op)>,
}

impl Update {
    /// Empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `$set`-style mutation.
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.ops.push((path.into(), Op::Set(value)));
        self
    }

    /// Append an `$unset`-style mutation.
    pub fn unset(mut self, path: impl Into<String>) -> Self {
        self.ops.push((path.into(), Op::Unset));
        self
    }

    /// Whether the update carries no mutations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every mutation in order.
    pub fn apply(&self, doc: &mut Value) {
        for (path, op) in &self.ops {
            match op {
                Op::Set(value) => set_path(doc, path, value.clone()),
                Op::Unset => unset_path(doc, path),
            }
        }
    }
}

fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cursor = doc;
    for segment in path.split('.') {
        cursor = match cursor {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

fn set_path(doc: &mut Value, path: &str, value: Value) {
    let mut cursor = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();

        // Numeric segments address existing array elements; a path into a
        // missing element is dropped rather than padding the array.
        if cursor.is_array() {
            let Ok(index) = segment.parse::<usize>() else {
                return;
            };
            let Some(slot) = cursor.get_mut(index) else {
                return;
            };
            if last {
                *slot = value;
                return;
            }
            cursor = slot;
            continue;
        }

        if !cursor.is_object() {
            *cursor = Value::Object(serde_json::Map::new());
        }
        let Some(map) = cursor.as_object_mut() else {
            return;
        };
        if last {
            map.insert(segment.to_string(), value);
            return;
        }
        cursor = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

fn unset_path(doc: &mut Value, path: &str) {
    let Some((parent_path, leaf)) = path.rsplit_once('.') else {
        if let Some(map) = doc.as_object_mut() {
            map.remove(path);
        }
        return;
    };
    let mut cursor = doc;
    for segment in parent_path.split('.') {
        let next = match cursor {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get_mut(index),
                Err(_) => None,
            },
            _ => None,
        };
        match next {
            Some(next) => cursor = next,
            None => return,
        }
    }
    if let Some(map) = cursor.as_object_mut() {
        map.remove(leaf);
    }
}
