//! Typed book repository over the document store.
//!
//! Every coordination primitive of the branch cache lives here as one
//! conditional update, so the compare-and-set predicates stay in a single
//! place and the coordinator reads as protocol, not path strings.

use crate::{DocumentStore, Filter, Update};
use serde_json::{json, Value};
use std::sync::Arc;
use taleweave_core::{now_millis, Book, BookConfig, BranchKey, Candidate, Page, PendingVerify, Plan, StoryState};
use taleweave_error::{StoreError, StoreErrorKind};
use tracing::{debug, instrument};

fn cache_path(key: &BranchKey) -> String {
    format!("story.branchCache.{key}")
}

fn cache_at_path(key: &BranchKey) -> String {
    format!("story.branchCacheAt.{key}")
}

fn pending_path(key: &BranchKey) -> String {
    format!("story.branchPending.{key}")
}

fn to_doc<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::new(StoreErrorKind::Codec(e.to_string())))
}

fn from_doc<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::new(StoreErrorKind::Codec(e.to_string())))
}

/// The story-state fields a commit rewrites.
///
/// Branch cache maps are deliberately absent: they are only touched through
/// the per-key conditional updates, so a commit can never clobber a
/// concurrent precompute's write.
#[derive(Debug, Clone)]
pub struct CommitFields {
    /// Pages after truncate-and-append
    pub pages: Vec<Page>,
    /// New head index
    pub index: i64,
    /// Notes after merging the candidate's delta
    pub notes: Vec<String>,
    /// New head summary
    pub summary: String,
    /// Incremented turn counter
    pub turn: u64,
    /// Deferred verification record carried by the candidate, if any
    pub pending_verify: Option<PendingVerify>,
}

/// Typed access to book documents.
#[derive(Clone)]
pub struct BookRepository {
    store: Arc<dyn DocumentStore>,
}

impl BookRepository {
    /// Wrap a document store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create and persist an empty book.
    pub async fn create(&self, owner: &str) -> Result<Book, StoreError> {
        let book = Book::new(owner);
        self.store.insert_one(to_doc(&book)?).await?;
        Ok(book)
    }

    /// Fetch a book, `None` when absent.
    pub async fn find(&self, id: &str) -> Result<Option<Book>, StoreError> {
        match self.store.find_one(id).await? {
            Some(doc) => Ok(Some(from_doc(doc)?)),
            None => Ok(None),
        }
    }

    /// Fetch a book, erroring when absent.
    pub async fn load(&self, id: &str) -> Result<Book, StoreError> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::new(StoreErrorKind::NotFound(id.to_string())))
    }

    async fn apply(&self, id: &str, filter: Filter, update: Update) -> Result<bool, StoreError> {
        let update = update.set("updatedAt", json!(now_millis()));
        self.store.update_one(id, filter, update).await
    }

    /// Replace the authoring configuration.
    pub async fn update_config(&self, id: &str, config: &BookConfig) -> Result<bool, StoreError> {
        self.apply(id, Filter::new(), Update::new().set("config", to_doc(config)?))
            .await
    }

    /// Install a plan wholesale (initial generation or adaptation).
    pub async fn set_plan(&self, id: &str, plan: &Plan) -> Result<bool, StoreError> {
        self.apply(id, Filter::new(), Update::new().set("plan", to_doc(plan)?))
            .await
    }

    /// Replace one point's substep list.
    pub async fn set_point_substeps(
        &self,
        id: &str,
        point_index: usize,
        substeps: &[String],
    ) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new().exists(format!("plan.points.{point_index}"), true),
            Update::new().set(
                format!("plan.points.{point_index}.substeps"),
                to_doc(&substeps)?,
            ),
        )
        .await
    }

    /// Flip the plan-adaptation latch.
    pub async fn set_plan_updating(&self, id: &str, updating: bool) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new(),
            Update::new().set("planUpdating", json!(updating)),
        )
        .await
    }

    /// Move the plan cursor to a verified position.
    pub async fn advance_plan_cursor(
        &self,
        id: &str,
        cur_point: usize,
        cur_sub: usize,
    ) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new().exists("plan", true),
            Update::new()
                .set("plan.curPoint", json!(cur_point))
                .set("plan.curSub", json!(cur_sub)),
        )
        .await
    }

    /// Drop the deferred verification record.
    pub async fn clear_pending_verify(&self, id: &str) -> Result<bool, StoreError> {
        self.apply(id, Filter::new(), Update::new().unset("story.pendingVerify"))
            .await
    }

    /// Install an empty story state unless one exists.
    pub async fn init_story_if_absent(&self, id: &str) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new().exists("story", false),
            Update::new().set("story", to_doc(&StoryState::empty())?),
        )
        .await
    }

    /// Claim the right to generate `key`: matches only while the cache entry
    /// and any pending claim are both absent.
    #[instrument(skip(self), fields(book = id, key = %key))]
    pub async fn try_claim(
        &self,
        id: &str,
        key: &BranchKey,
        now: i64,
    ) -> Result<bool, StoreError> {
        let claimed = self
            .apply(
                id,
                Filter::new()
                    .exists(cache_path(key), false)
                    .exists(pending_path(key), false)
                    .exists("story", true),
                Update::new().set(pending_path(key), json!(now)),
            )
            .await?;
        debug!(claimed, "branch claim attempt");
        Ok(claimed)
    }

    /// Claim `key` allowing a refresh of a stale cache entry: the fresh-claim
    /// predicate first, then "cache written at or before `stale_before` and no
    /// pending claim".
    pub async fn try_claim_with_refresh(
        &self,
        id: &str,
        key: &BranchKey,
        now: i64,
        stale_before: i64,
    ) -> Result<bool, StoreError> {
        if self.try_claim(id, key, now).await? {
            return Ok(true);
        }
        self.apply(
            id,
            Filter::new()
                .lte(cache_at_path(key), stale_before)
                .exists(pending_path(key), false),
            Update::new().set(pending_path(key), json!(now)),
        )
        .await
    }

    /// Take over an abandoned claim: matches only while the pending timestamp
    /// still equals the value the caller observed.
    #[instrument(skip(self), fields(book = id, key = %key))]
    pub async fn try_takeover(
        &self,
        id: &str,
        key: &BranchKey,
        observed: i64,
        now: i64,
    ) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new().eq(pending_path(key), json!(observed)),
            Update::new().set(pending_path(key), json!(now)),
        )
        .await
    }

    /// Clear a stale cache entry, conditional on the timestamp the caller saw.
    pub async fn clear_stale_cache(
        &self,
        id: &str,
        key: &BranchKey,
        observed_at: i64,
    ) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new().eq(cache_at_path(key), json!(observed_at)),
            Update::new().unset(cache_path(key)).unset(cache_at_path(key)),
        )
        .await
    }

    /// Publish a generated candidate and release the claim in one update.
    pub async fn store_candidate(
        &self,
        id: &str,
        key: &BranchKey,
        candidate: &Candidate,
        at: i64,
    ) -> Result<bool, StoreError> {
        self.apply(
            id,
            Filter::new(),
            Update::new()
                .set(cache_path(key), to_doc(candidate)?)
                .set(cache_at_path(key), json!(at))
                .unset(pending_path(key)),
        )
        .await
    }

    /// Release a claim without publishing anything.
    pub async fn release_claim(&self, id: &str, key: &BranchKey) -> Result<bool, StoreError> {
        self.apply(id, Filter::new(), Update::new().unset(pending_path(key)))
            .await
    }

    /// Rewrite the story fields a commit owns.
    pub async fn commit_story(&self, id: &str, fields: &CommitFields) -> Result<bool, StoreError> {
        let mut update = Update::new()
            .set("story.pages", to_doc(&fields.pages)?)
            .set("story.index", json!(fields.index))
            .set("story.notes", to_doc(&fields.notes)?)
            .set("story.summary", json!(fields.summary))
            .set("story.turn", json!(fields.turn));
        update = match &fields.pending_verify {
            Some(pending) => update.set("story.pendingVerify", to_doc(pending)?),
            None => update.unset("story.pendingVerify"),
        };
        self.apply(id, Filter::new().exists("story", true), update).await
    }

    /// Drop the given branch cache entries (and their timestamps).
    pub async fn prune_branch_keys(
        &self,
        id: &str,
        keys: &[BranchKey],
    ) -> Result<bool, StoreError> {
        if keys.is_empty() {
            return Ok(true);
        }
        let mut update = Update::new();
        for key in keys {
            update = update.unset(cache_path(key)).unset(cache_at_path(key));
        }
        self.apply(id, Filter::new(), update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn candidate() -> Candidate {
        Candidate {
            page: Page {
                passage: "p".into(),
                summary: "s".into(),
                ..Page::default()
            },
            notes_delta: vec![],
            sub_to_check: None,
        }
    }

    async fn seeded_repo() -> (BookRepository, String) {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        let book = repo.create("owner").await.unwrap();
        repo.init_story_if_absent(&book.id).await.unwrap();
        (repo, book.id)
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let (repo, id) = seeded_repo().await;
        let key = BranchKey::next(0);
        assert!(repo.try_claim(&id, &key, 1_000).await.unwrap());
        // Second claim loses while the pending entry stands.
        assert!(!repo.try_claim(&id, &key, 1_001).await.unwrap());

        repo.release_claim(&id, &key).await.unwrap();
        assert!(repo.try_claim(&id, &key, 1_002).await.unwrap());
    }

    #[tokio::test]
    async fn claim_requires_story() {
        let repo = BookRepository::new(Arc::new(MemoryStore::new()));
        let book = repo.create("owner").await.unwrap();
        assert!(!repo
            .try_claim(&book.id, &BranchKey::next(0), 1)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn cached_entry_blocks_claim_until_refresh() {
        let (repo, id) = seeded_repo().await;
        let key = BranchKey::next(0);
        assert!(repo.try_claim(&id, &key, 1_000).await.unwrap());
        assert!(repo.store_candidate(&id, &key, &candidate(), 1_050).await.unwrap());

        assert!(!repo.try_claim(&id, &key, 2_000).await.unwrap());
        // Refresh only matches once the entry is old enough.
        assert!(!repo
            .try_claim_with_refresh(&id, &key, 2_000, 1_000)
            .await
            .unwrap());
        assert!(repo
            .try_claim_with_refresh(&id, &key, 2_000, 1_050)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn takeover_needs_the_observed_timestamp() {
        let (repo, id) = seeded_repo().await;
        let key = BranchKey::next(3);
        assert!(repo.try_claim(&id, &key, 5_000).await.unwrap());

        // A racer observed an older value and loses.
        assert!(!repo.try_takeover(&id, &key, 4_999, 9_000).await.unwrap());
        assert!(repo.try_takeover(&id, &key, 5_000, 9_000).await.unwrap());

        let book = repo.load(&id).await.unwrap();
        let pending = &book.story.unwrap().branch_pending;
        assert_eq!(pending.get(&key.to_string()), Some(&9_000));
    }

    #[tokio::test]
    async fn clear_stale_cache_is_cas_on_timestamp() {
        let (repo, id) = seeded_repo().await;
        let key = BranchKey::next(1);
        repo.try_claim(&id, &key, 1).await.unwrap();
        repo.store_candidate(&id, &key, &candidate(), 100).await.unwrap();

        assert!(!repo.clear_stale_cache(&id, &key, 99).await.unwrap());
        assert!(repo.clear_stale_cache(&id, &key, 100).await.unwrap());

        let book = repo.load(&id).await.unwrap();
        let story = book.story.unwrap();
        assert!(story.branch_cache.is_empty());
        assert!(story.branch_cache_at.is_empty());
    }

    #[tokio::test]
    async fn prune_removes_entries_and_timestamps() {
        let (repo, id) = seeded_repo().await;
        for index in [0, 1, 2] {
            let key = BranchKey::next(index);
            repo.try_claim(&id, &key, 1).await.unwrap();
            repo.store_candidate(&id, &key, &candidate(), 10).await.unwrap();
        }
        repo.prune_branch_keys(&id, &[BranchKey::next(1), BranchKey::next(2)])
            .await
            .unwrap();

        let story = repo.load(&id).await.unwrap().story.unwrap();
        assert!(story.branch_cache.contains_key("0:__next__"));
        assert!(!story.branch_cache.contains_key("1:__next__"));
        assert!(!story.branch_cache_at.contains_key("2:__next__"));
    }
}
