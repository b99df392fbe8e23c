//! The branch cache coordinator.

use crate::RuntimeConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use taleweave_core::{now_millis, Book, BranchKey, StoryState};
use taleweave_engine::{GenerateSpec, PageGenerator, PlanEngine, Verifier};
use taleweave_error::{TaleweaveResult, TimeoutError};
use taleweave_store::BookRepository;
use tracing::{debug, info, instrument, warn};

/// Readiness report for one page index.
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    /// Whether the linear continuation is prepared
    pub next: bool,
    /// Per-option preparedness, keyed by option id
    pub options: BTreeMap<String, bool>,
}

/// Coordinates speculative generation over the branch cache.
#[derive(Clone)]
pub struct Coordinator {
    repo: BookRepository,
    plan_engine: PlanEngine,
    generator: PageGenerator,
    verifier: Verifier,
    config: RuntimeConfig,
}

impl Coordinator {
    /// Assemble a coordinator.
    pub fn new(
        repo: BookRepository,
        plan_engine: PlanEngine,
        generator: PageGenerator,
        verifier: Verifier,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            repo,
            plan_engine,
            generator,
            verifier,
            config,
        }
    }

    /// The repository this coordinator writes through.
    pub fn repo(&self) -> &BookRepository {
        &self.repo
    }

    fn is_fresh(&self, story: &StoryState, key: &BranchKey, now: i64) -> bool {
        let key = key.to_string();
        if !story.branch_cache.contains_key(&key) {
            return false;
        }
        story
            .branch_cache_at
            .get(&key)
            .map_or(true, |at| now - at <= self.config.stale_millis())
    }

    /// Blocking readiness primitive for the linear continuation of `index`.
    ///
    /// Returns `Ok(true)` once `branchCache["${index}:__next__"]` holds a
    /// fresh entry, whether this call generated it, another writer did, or it
    /// was already there. Returns `Ok(false)` without waiting while a plan
    /// adaptation is in flight; the client retries. Errors with a timeout
    /// after the configured ceiling.
    #[instrument(skip(self), fields(book = book_id, index))]
    pub async fn ensure_ready(&self, book_id: &str, index: i64) -> TaleweaveResult<bool> {
        let key = BranchKey::next(index);
        let started = Instant::now();

        let book = self.repo.load(book_id).await?;
        if book.plan_updating {
            debug!("plan updating, reporting not ready");
            return Ok(false);
        }

        if let Some(story) = &book.story {
            let now = now_millis();
            let key_str = key.to_string();
            if self.is_fresh(story, &key, now) {
                return Ok(true);
            }
            // A present-but-stale entry blocks the claim predicate; clear it
            // conditionally on the timestamp we just observed.
            if story.branch_cache.contains_key(&key_str) {
                if let Some(at) = story.branch_cache_at.get(&key_str) {
                    self.repo.clear_stale_cache(book_id, &key, *at).await?;
                }
            }
        }

        loop {
            let now = now_millis();
            if self.repo.try_claim(book_id, &key, now).await? {
                self.generate_as_owner(book_id, &key, None).await?;
                return Ok(true);
            }

            // Someone else holds the claim, or the entry appeared. Poll.
            let book = self.repo.load(book_id).await?;
            if let Some(story) = &book.story {
                let now = now_millis();
                // An entry appearing mid-wait was written just now; presence
                // is enough here, freshness only gates the fast path above.
                if story.branch_cache.contains_key(&key.to_string()) {
                    return Ok(true);
                }
                if let Some(observed) = story.branch_pending.get(&key.to_string()) {
                    if now - observed > self.config.stale_millis()
                        && self.repo.try_takeover(book_id, &key, *observed, now).await?
                    {
                        info!(key = %key, "took over abandoned claim");
                        self.generate_as_owner(book_id, &key, None).await?;
                        return Ok(true);
                    }
                }
            }

            if started.elapsed() >= self.config.wait_timeout {
                return Err(TimeoutError::new(started.elapsed().as_millis() as u64).into());
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Owner-side generation: verify any pending sub-step, make sure the plan
    /// is ready, generate, publish. Releases the claim on any failure.
    async fn generate_as_owner(
        &self,
        book_id: &str,
        key: &BranchKey,
        choice: Option<&str>,
    ) -> TaleweaveResult<()> {
        match self.generate_candidate(book_id, key, choice).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if let Err(release_err) = self.repo.release_claim(book_id, key).await {
                    warn!(error = %release_err, key = %key, "failed to release claim");
                }
                Err(err)
            }
        }
    }

    async fn generate_candidate(
        &self,
        book_id: &str,
        key: &BranchKey,
        choice: Option<&str>,
    ) -> TaleweaveResult<()> {
        let book = self.repo.load(book_id).await?;
        self.verifier.verify_pending_before_next(&book).await;

        // Reload: verification may have advanced the cursor.
        let book = self.repo.load(book_id).await?;
        let plan = self.plan_engine.ensure_plan_ready(&book).await?;

        let spec = GenerateSpec {
            up_to_index: key.index,
            option_base_index: key.index + 1,
            next_choice: choice,
            allow_options: true,
        };
        let candidate = self.generator.generate(&book, &plan, &spec).await?;
        self.repo
            .store_candidate(book_id, key, &candidate, now_millis())
            .await?;
        debug!(key = %key, "candidate cached");
        Ok(())
    }

    /// Fire-and-forget precompute of the linear continuation of `index`.
    ///
    /// Claims with the stale-refresh predicate and generates silently; every
    /// error is swallowed and logged. Respects the plan-adaptation latch.
    pub fn spawn_precompute_next(&self, book_id: String, index: i64) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator
                .precompute(&book_id, &BranchKey::next(index), None)
                .await;
        });
    }

    /// Fire-and-forget precompute of option branches for `index`.
    pub fn spawn_precompute_branches(
        &self,
        book_id: String,
        index: i64,
        options: Vec<(String, String)>,
    ) {
        for (option_id, text) in options {
            let coordinator = self.clone();
            let book_id = book_id.clone();
            tokio::spawn(async move {
                coordinator
                    .precompute(&book_id, &BranchKey::option(index, option_id), Some(&text))
                    .await;
            });
        }
    }

    /// Precompute one branch, inline. Never errors.
    #[instrument(skip(self, choice), fields(book = book_id, key = %key))]
    pub async fn precompute(&self, book_id: &str, key: &BranchKey, choice: Option<&str>) {
        let book = match self.repo.load(book_id).await {
            Ok(book) => book,
            Err(err) => {
                warn!(error = %err, "precompute could not load book");
                return;
            }
        };
        if book.plan_updating {
            debug!("plan updating, skipping precompute");
            return;
        }

        let now = now_millis();
        let stale_before = now - self.config.stale_millis();
        let claimed = match self
            .repo
            .try_claim_with_refresh(book_id, key, now, stale_before)
            .await
        {
            Ok(claimed) => claimed,
            Err(err) => {
                warn!(error = %err, "precompute claim failed");
                return;
            }
        };
        if !claimed {
            debug!("branch already cached or claimed elsewhere");
            return;
        }

        if let Err(err) = self.generate_as_owner(book_id, key, choice).await {
            warn!(error = %err, "precompute generation failed");
        }
    }

    /// Kick off precompute for any option of `pages[index]` whose cache entry
    /// is absent or stale. Returns immediately.
    pub async fn ensure_options_precompute(&self, book_id: &str, index: i64) {
        let book = match self.repo.load(book_id).await {
            Ok(book) => book,
            Err(err) => {
                warn!(error = %err, "option precompute could not load book");
                return;
            }
        };
        let Some(story) = &book.story else { return };
        let Some(page) = story.page_at(index) else {
            return;
        };
        let (Some(options), Some(option_ids)) = (&page.options, &page.option_ids) else {
            return;
        };

        let now = now_millis();
        let mut missing = Vec::new();
        for (option_id, text) in option_ids.iter().zip(options) {
            let key = BranchKey::option(index, option_id.clone());
            if !self.is_fresh(story, &key, now) {
                missing.push((option_id.clone(), text.clone()));
            }
        }
        if !missing.is_empty() {
            debug!(count = missing.len(), "scheduling option precompute");
            self.spawn_precompute_branches(book_id.to_string(), index, missing);
        }
    }

    /// Report readiness of the linear continuation and each option of
    /// `pages[index]` from the current document state, without generating.
    pub async fn readiness(&self, book_id: &str, index: i64, next: bool) -> TaleweaveResult<Readiness> {
        let book = self.repo.load(book_id).await?;
        let mut options = BTreeMap::new();
        if let Some(story) = &book.story {
            if let Some(page) = story.page_at(index) {
                if let Some(option_ids) = &page.option_ids {
                    let now = now_millis();
                    for option_id in option_ids {
                        let key = BranchKey::option(index, option_id.clone());
                        options.insert(option_id.clone(), self.is_fresh(story, &key, now));
                    }
                }
            }
        }
        Ok(Readiness { next, options })
    }

    /// Drop every cache entry strictly ahead of the committed head.
    ///
    /// Historical entries stay for future rewinds; sibling options at the
    /// head index stay too and are re-pruned by later commits.
    pub async fn prune_forward(&self, book_id: &str, head_index: i64) -> TaleweaveResult<()> {
        let book = self.repo.load(book_id).await?;
        let Some(story) = &book.story else {
            return Ok(());
        };
        let forward: Vec<BranchKey> = story
            .branch_cache
            .keys()
            .chain(story.branch_cache_at.keys())
            .filter_map(|raw| raw.parse::<BranchKey>().ok())
            .filter(|key| key.index > head_index)
            .collect();
        if !forward.is_empty() {
            debug!(count = forward.len(), head_index, "pruning forward branch cache");
            self.repo.prune_branch_keys(book_id, &forward).await?;
        }
        Ok(())
    }

    /// Drop one consumed entry after its page was committed.
    pub async fn consume_entry(&self, book_id: &str, key: &BranchKey) -> TaleweaveResult<()> {
        self.repo.prune_branch_keys(book_id, &[key.clone()]).await?;
        Ok(())
    }

    /// The cached candidate for `key`, when present.
    ///
    /// Commit paths accept any present entry: the client was gated by the
    /// readiness poll, which is where freshness is enforced.
    pub fn cached_candidate(&self, book: &Book, key: &BranchKey) -> Option<taleweave_core::Candidate> {
        book.story
            .as_ref()
            .and_then(|story| story.branch_cache.get(&key.to_string()))
            .cloned()
    }
}
