//! Page generation.

use crate::ModelSelection;
use rand::Rng;
use std::sync::Arc;
use taleweave_core::{make_option_id, Book, Candidate, Page, Plan, SubToCheck};
use taleweave_error::TaleweaveResult;
use taleweave_gateway::{ChatGateway, ChatOptions, ResponseFormat};
use taleweave_prompt::{page_messages, parse_reply, Focus, PageDraft, PagePrompt};
use tracing::{debug, instrument};

/// What a single generation should produce.
#[derive(Debug, Clone)]
pub struct GenerateSpec<'a> {
    /// Index of the page the continuation starts from; `-1` for the opening
    pub up_to_index: i64,
    /// Index the generated page will be committed at; seeds option ids
    pub option_base_index: i64,
    /// The player's choice driving this page, if any
    pub next_choice: Option<&'a str>,
    /// Whether the model may offer choices on this page
    pub allow_options: bool,
}

/// Turns (plan cursor, configuration, recent context, optional choice) into a
/// page candidate.
#[derive(Clone)]
pub struct PageGenerator {
    gateway: Arc<dyn ChatGateway>,
    models: ModelSelection,
}

impl PageGenerator {
    /// Create a page generator.
    pub fn new(gateway: Arc<dyn ChatGateway>, models: ModelSelection) -> Self {
        Self { gateway, models }
    }

    /// Generate one candidate page.
    ///
    /// The plan cursor is read, never advanced: when the turn runs under a
    /// sub-step focus the candidate carries a [`SubToCheck`] and advancement
    /// waits for the verifier.
    #[instrument(skip_all, fields(book = %book.id, up_to = spec.up_to_index))]
    pub async fn generate(
        &self,
        book: &Book,
        plan: &Plan,
        spec: &GenerateSpec<'_>,
    ) -> TaleweaveResult<Candidate> {
        let focus = pick_focus(book, plan, spec, &mut rand::thread_rng());
        let sub_to_check = match &focus {
            Focus::Substep { text, .. } => plan.current_substep().and_then(
                |(point_index, sub_index, current)| {
                    (current == text).then(|| SubToCheck {
                        point_index,
                        sub_index,
                        text: text.clone(),
                    })
                },
            ),
            _ => None,
        };
        debug!(?focus, "selected focus");

        let story = book.story.as_ref();
        let summary = story
            .map(|s| s.summary.as_str())
            .filter(|s| !s.is_empty());
        let notes: &[String] = story.map_or(&[], |s| s.notes.as_slice());
        let recent_passages = story.map_or_else(Vec::new, |s| {
            let end = (spec.up_to_index + 1).clamp(0, s.pages.len() as i64) as usize;
            let start = end.saturating_sub(3);
            s.pages[start..end].iter().map(|p| p.passage.as_str()).collect()
        });

        let prompt = PagePrompt {
            config: &book.config,
            focus,
            allow_options: spec.allow_options,
            summary,
            notes,
            recent_passages,
            next_choice: spec.next_choice,
        };
        let opts = ChatOptions::tagged("page.generate")
            .with_model_opt(self.models.page.clone())
            .with_response_format(ResponseFormat::JsonObject);
        let reply = self.gateway.chat(&page_messages(&prompt), &opts).await?;
        let draft: PageDraft = parse_reply(&reply)?;
        let draft = draft.validate(spec.allow_options)?;

        let option_ids = draft.options.as_ref().map(|options| {
            options
                .iter()
                .map(|text| make_option_id(spec.option_base_index, text))
                .collect()
        });
        Ok(Candidate {
            page: Page {
                passage: draft.passage,
                summary: draft.summary,
                options: draft.options,
                option_ids,
            },
            notes_delta: draft.notes,
            sub_to_check,
        })
    }
}

/// Pick the focus for one turn.
///
/// Transition windows (the opening page, or the tail of a point with a
/// successor) force a sub-step focus with buildup guidance; otherwise the
/// three modes are equally likely, with sub-step falling back uniformly to
/// world or character when the cursor has nothing left.
fn pick_focus<R: Rng>(book: &Book, plan: &Plan, spec: &GenerateSpec<'_>, rng: &mut R) -> Focus {
    let current = plan.current_substep();

    let opening = spec.up_to_index < 0
        && spec.next_choice.is_none()
        && plan.cur_point == 0
        && plan.cur_sub == 0
        && book
            .story
            .as_ref()
            .map_or(true, |s| s.summary.is_empty());
    let point_tail =
        plan.remaining_in_point().is_some_and(|left| left <= 2) && plan.next_point().is_some();

    if opening || point_tail {
        if let Some((_, _, text)) = current {
            return Focus::Substep {
                text: text.to_string(),
                buildup: plan.next_point().cloned(),
            };
        }
    }

    match rng.gen_range(0..3u8) {
        0 => match current {
            Some((_, _, text)) => Focus::Substep {
                text: text.to_string(),
                buildup: None,
            },
            None if rng.gen_bool(0.5) => Focus::World,
            None => Focus::Character,
        },
        1 => Focus::World,
        _ => Focus::Character,
    }
}
