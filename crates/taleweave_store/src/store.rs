//! The document store trait.

use crate::{Filter, Update};
use async_trait::async_trait;
use serde_json::Value;
use taleweave_error::StoreError;

/// Minimal contract the engine requires from a document store.
///
/// The store must apply each `update_one` atomically with respect to other
/// updates on the same document, and a writer must observe its own completed
/// updates on subsequent reads. Those two properties are what the branch
/// cache coordinator's claim/takeover protocol is built on; nothing else is
/// assumed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. The document carries its id in an `id` field.
    async fn insert_one(&self, doc: Value) -> Result<(), StoreError>;

    /// Fetch a whole document by id.
    async fn find_one(&self, id: &str) -> Result<Option<Value>, StoreError>;

    /// Conditionally update the document with the given id.
    ///
    /// Returns `true` when the document existed and matched `filter`, in
    /// which case `update` was applied atomically; `false` otherwise.
    async fn update_one(&self, id: &str, filter: Filter, update: Update)
        -> Result<bool, StoreError>;
}
