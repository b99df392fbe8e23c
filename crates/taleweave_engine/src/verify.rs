//! Deferred sub-step verification.

use crate::ModelSelection;
use std::sync::Arc;
use taleweave_core::Book;
use taleweave_gateway::{ChatGateway, ChatOptions, ResponseFormat};
use taleweave_prompt::{parse_reply, verifier_messages, VerifierVerdict};
use taleweave_store::BookRepository;
use tracing::{debug, instrument, warn};

/// Checks whether a committed page accomplished its tagged sub-step.
///
/// Runs at most once per pending-verify record, immediately before the next
/// page generation for the book. Never surfaces errors: an unusable reply
/// counts as not-done and the record is cleared either way, so a flaky model
/// cannot wedge generation.
#[derive(Clone)]
pub struct Verifier {
    gateway: Arc<dyn ChatGateway>,
    repo: BookRepository,
    models: ModelSelection,
}

impl Verifier {
    /// Create a verifier.
    pub fn new(gateway: Arc<dyn ChatGateway>, repo: BookRepository, models: ModelSelection) -> Self {
        Self {
            gateway,
            repo,
            models,
        }
    }

    /// Consume the book's pending-verify record, advancing the plan cursor
    /// when the model confirms the sub-step was dramatized.
    #[instrument(skip(self, book), fields(book = %book.id))]
    pub async fn verify_pending_before_next(&self, book: &Book) {
        let Some(story) = &book.story else { return };
        let Some(pending) = &story.pending_verify else { return };

        let end = story.pages.len().saturating_sub(1);
        let start = end.saturating_sub(3);
        let recent: Vec<&str> = story.pages[start..end]
            .iter()
            .map(|p| p.passage.as_str())
            .collect();

        let opts = ChatOptions::tagged("verify.substep")
            .with_model_opt(self.models.verifier.clone())
            .with_response_format(ResponseFormat::JsonObject);
        let messages = verifier_messages(&pending.passage, &pending.sub_text, &recent, &story.notes);

        let done = match self.gateway.chat(&messages, &opts).await {
            Ok(reply) => parse_reply::<VerifierVerdict>(&reply)
                .map(|v| v.done)
                .unwrap_or(false),
            Err(err) => {
                debug!(error = %err, "verifier call failed, treating as not done");
                false
            }
        };

        if done {
            if let Some(plan) = &book.plan {
                let mut advanced = plan.clone();
                advanced.advance_cursor();
                if let Err(err) = self
                    .repo
                    .advance_plan_cursor(&book.id, advanced.cur_point, advanced.cur_sub)
                    .await
                {
                    warn!(error = %err, "failed to persist cursor advance");
                }
            }
        }

        // Cleared unconditionally so one record never gets re-checked.
        if let Err(err) = self.repo.clear_pending_verify(&book.id).await {
            warn!(error = %err, "failed to clear pendingVerify");
        }
        debug!(done, "verifier finished");
    }
}
