//! In-process document store.

use crate::{DocumentStore, Filter, Update};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use taleweave_error::{StoreError, StoreErrorKind};

/// Document store backed by an in-process map.
///
/// Used by tests and single-node development. Each operation holds the map
/// lock for its whole duration, which gives the same per-document atomicity
/// the trait demands from real backends.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, doc: Value) -> Result<(), StoreError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::new(StoreErrorKind::Codec("document without id".into())))?
            .to_string();
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Backend("store lock poisoned".into())))?;
        docs.insert(id, doc);
        Ok(())
    }

    async fn find_one(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Backend("store lock poisoned".into())))?;
        Ok(docs.get(id).cloned())
    }

    async fn update_one(
        &self,
        id: &str,
        filter: Filter,
        update: Update,
    ) -> Result<bool, StoreError> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Backend("store lock poisoned".into())))?;
        let Some(doc) = docs.get_mut(id) else {
            return Ok(false);
        };
        if !filter.matches(doc) {
            return Ok(false);
        }
        update.apply(doc);
        Ok(true)
    }
}
