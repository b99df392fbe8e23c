//! The story runtime: the thin API layer over the coordinator.

use crate::{Coordinator, Readiness};
use taleweave_core::{
    Book, BranchKey, Candidate, PendingVerify, StoryState, StorySnapshot,
};
use taleweave_engine::{GenerateSpec, PageGenerator, PlanEngine, Verifier};
use taleweave_error::{RequestError, TaleweaveResult};
use taleweave_store::{BookRepository, CommitFields};
use tracing::{debug, info, instrument};

/// A reader's choice at a choice page.
#[derive(Debug, Clone, Default)]
pub struct ChooseRequest {
    /// Index of the page the choice appears on
    pub index: i64,
    /// Id of a predefined option, when the reader picked one
    pub option_id: Option<String>,
    /// Free-text choice, the fallback when no option id resolves
    pub text: Option<String>,
}

/// Translates external calls into coordinator actions and commits.
#[derive(Clone)]
pub struct StoryService {
    repo: BookRepository,
    coordinator: Coordinator,
    plan_engine: PlanEngine,
    generator: PageGenerator,
    verifier: Verifier,
}

impl StoryService {
    /// Assemble the service.
    pub fn new(
        repo: BookRepository,
        coordinator: Coordinator,
        plan_engine: PlanEngine,
        generator: PageGenerator,
        verifier: Verifier,
    ) -> Self {
        Self {
            repo,
            coordinator,
            plan_engine,
            generator,
            verifier,
        }
    }

    /// The repository backing this service.
    pub fn repo(&self) -> &BookRepository {
        &self.repo
    }

    /// The coordinator backing this service.
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Current read-only projection of a book.
    pub async fn snapshot(&self, book_id: &str) -> TaleweaveResult<StorySnapshot> {
        let book = self.repo.load(book_id).await?;
        Ok(StorySnapshot::project(&book))
    }

    /// Start the story: make sure a plan and story state exist, generate and
    /// commit the opening page, and kick off precompute for its
    /// continuations. Returns the existing story untouched when pages are
    /// already committed.
    #[instrument(skip(self), fields(book = book_id))]
    pub async fn start(&self, book_id: &str) -> TaleweaveResult<StorySnapshot> {
        let book = self.repo.load(book_id).await?;
        if book
            .story
            .as_ref()
            .is_some_and(|story| !story.pages.is_empty())
        {
            return Ok(StorySnapshot::project(&book));
        }

        let plan = self.plan_engine.ensure_plan_ready(&book).await?;
        self.repo.init_story_if_absent(book_id).await?;
        let book = self.repo.load(book_id).await?;

        let spec = GenerateSpec {
            up_to_index: -1,
            option_base_index: 0,
            next_choice: None,
            allow_options: true,
        };
        let candidate = self.generator.generate(&book, &plan, &spec).await?;
        let snapshot = self.commit(&book, candidate, -1, None).await?;
        info!("opening page committed");

        self.coordinator.spawn_precompute_next(book_id.to_string(), 0);
        self.coordinator.ensure_options_precompute(book_id, 0).await;
        Ok(snapshot)
    }

    /// Blocking readiness poll for `index`.
    ///
    /// Prepares the linear continuation synchronously (joining or triggering
    /// its generation) and fires option precompute in the background; options
    /// are never waited for.
    #[instrument(skip(self), fields(book = book_id, index))]
    pub async fn ready(&self, book_id: &str, index: i64) -> TaleweaveResult<Readiness> {
        let book = self.repo.load(book_id).await?;
        if book.story.is_none() {
            return Err(RequestError::bad_request("story not started").into());
        }
        validate_index(&book, index, true)?;

        {
            let coordinator = self.coordinator.clone();
            let book_id = book_id.to_string();
            tokio::spawn(async move {
                coordinator.ensure_options_precompute(&book_id, index).await;
            });
        }

        let next = self.coordinator.ensure_ready(book_id, index).await?;
        self.coordinator.readiness(book_id, index, next).await
    }

    /// Advance linearly from `index`, committing the cached continuation when
    /// present and generating it synchronously otherwise.
    #[instrument(skip(self), fields(book = book_id, index))]
    pub async fn next(&self, book_id: &str, index: i64) -> TaleweaveResult<StorySnapshot> {
        let book = self.repo.load(book_id).await?;
        if book.story.is_none() {
            return Err(RequestError::bad_request("story not started").into());
        }
        validate_index(&book, index, true)?;

        let key = BranchKey::next(index);
        let candidate = match self.coordinator.cached_candidate(&book, &key) {
            Some(candidate) => candidate,
            None => {
                if !self.coordinator.ensure_ready(book_id, index).await? {
                    return Err(RequestError::bad_request(
                        "book is busy adapting its plan; retry",
                    )
                    .into());
                }
                let book = self.repo.load(book_id).await?;
                self.coordinator
                    .cached_candidate(&book, &key)
                    .ok_or_else(|| RequestError::bad_request("continuation not ready"))?
            }
        };

        let book = self.repo.load(book_id).await?;
        let snapshot = self.commit(&book, candidate, index, Some(&key)).await?;

        let head = snapshot.index;
        self.coordinator
            .spawn_precompute_next(book_id.to_string(), head);
        self.coordinator.ensure_options_precompute(book_id, head).await;
        Ok(snapshot)
    }

    /// Commit a reader choice, from cache when the branch was precomputed and
    /// synchronously otherwise, then adapt the plan in the background.
    /// Precompute for the new head is deferred until adaptation finishes.
    #[instrument(skip(self, request), fields(book = book_id, index = request.index))]
    pub async fn choose(
        &self,
        book_id: &str,
        request: &ChooseRequest,
    ) -> TaleweaveResult<StorySnapshot> {
        let book = self.repo.load(book_id).await?;
        validate_index(&book, request.index, false)?;

        let page = book
            .story
            .as_ref()
            .and_then(|story| story.page_at(request.index))
            .ok_or_else(|| RequestError::bad_request("no page at index"))?;

        // Resolve the choice text: a matching option id wins, free text is
        // the fallback.
        let matched = request.option_id.as_deref().and_then(|option_id| {
            let ids = page.option_ids.as_deref()?;
            let position = ids.iter().position(|id| id == option_id)?;
            let text = page.options.as_deref()?.get(position)?;
            Some((option_id.to_string(), text.clone()))
        });
        let choice_text = match &matched {
            Some((_, text)) => text.clone(),
            None => request
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .ok_or_else(|| RequestError::bad_request("no usable choice"))?,
        };

        let cached = matched.as_ref().and_then(|(option_id, _)| {
            let key = BranchKey::option(request.index, option_id.clone());
            self.coordinator
                .cached_candidate(&book, &key)
                .map(|candidate| (key, candidate))
        });
        let (consumed_key, candidate) = match cached {
            Some((key, candidate)) => {
                debug!(key = %key, "committing precomputed option branch");
                (Some(key), candidate)
            }
            None => {
                let candidate = self
                    .generate_choice_sync(&book, request.index, &choice_text)
                    .await?;
                (None, candidate)
            }
        };

        let book = self.repo.load(book_id).await?;
        let snapshot = self
            .commit(&book, candidate, request.index, consumed_key.as_ref())
            .await?;
        let head = snapshot.index;
        let committed_page = snapshot
            .pages
            .last()
            .cloned()
            .ok_or_else(|| RequestError::bad_request("commit produced no page"))?;

        // Raise the latch before responding so no new generation starts on
        // the stale plan, then adapt and only afterwards precompute.
        self.repo.set_plan_updating(book_id, true).await?;
        let plan_engine = self.plan_engine.clone();
        let coordinator = self.coordinator.clone();
        let book_id = book_id.to_string();
        tokio::spawn(async move {
            plan_engine
                .adapt_after_choice(&book_id, &choice_text, &committed_page)
                .await;
            coordinator.spawn_precompute_next(book_id.clone(), head);
            coordinator.ensure_options_precompute(&book_id, head).await;
        });

        Ok(snapshot)
    }

    /// Synchronous generation for a choice with no precomputed branch.
    async fn generate_choice_sync(
        &self,
        book: &Book,
        index: i64,
        choice: &str,
    ) -> TaleweaveResult<Candidate> {
        self.verifier.verify_pending_before_next(book).await;
        let book = self.repo.load(&book.id).await?;
        let plan = self.plan_engine.ensure_plan_ready(&book).await?;
        let spec = GenerateSpec {
            up_to_index: index,
            option_base_index: index + 1,
            next_choice: Some(choice),
            allow_options: true,
        };
        self.generator.generate(&book, &plan, &spec).await
    }

    /// Commit a candidate produced from `from_index`.
    ///
    /// Forward pages are discarded (the reader is always at the head), the
    /// candidate's page is appended, notes are merged, the deferred
    /// verification record is written, and the forward branch cache is
    /// pruned. `consumed_key` names the cache entry the candidate came from,
    /// when it came from the cache.
    async fn commit(
        &self,
        book: &Book,
        candidate: Candidate,
        from_index: i64,
        consumed_key: Option<&BranchKey>,
    ) -> TaleweaveResult<StorySnapshot> {
        let mut story = book.story.clone().unwrap_or_else(StoryState::empty);

        let keep = (from_index + 1).clamp(0, story.pages.len() as i64) as usize;
        story.pages.truncate(keep);
        story.pages.push(candidate.page.clone());
        story.index = from_index + 1;
        story.summary = candidate.page.summary.clone();
        story.merge_notes(&candidate.notes_delta);
        story.turn += 1;

        let pending_verify = candidate.sub_to_check.as_ref().map(|sub| PendingVerify {
            passage: candidate.page.passage.clone(),
            sub_text: sub.text.clone(),
            point_index: sub.point_index,
            sub_index: sub.sub_index,
        });

        let fields = CommitFields {
            pages: story.pages.clone(),
            index: story.index,
            notes: story.notes.clone(),
            summary: story.summary.clone(),
            turn: story.turn,
            pending_verify,
        };
        self.repo.commit_story(&book.id, &fields).await?;

        if let Some(key) = consumed_key {
            self.coordinator.consume_entry(&book.id, key).await?;
        }
        self.coordinator.prune_forward(&book.id, story.index).await?;

        let book = self.repo.load(&book.id).await?;
        Ok(StorySnapshot::project(&book))
    }
}

fn validate_index(book: &Book, index: i64, allow_before_first: bool) -> Result<(), RequestError> {
    let floor = if allow_before_first { -1 } else { 0 };
    let last = book.head_index();
    if index < floor || index > last {
        return Err(RequestError::bad_request(format!(
            "index {index} out of range ({floor}..={last})"
        )));
    }
    Ok(())
}
