//! Plan lifecycle: generate, expand, intro-insert, adapt.

use crate::ModelSelection;
use std::sync::Arc;
use taleweave_core::{Book, BookConfig, Page, Plan, Point};
use taleweave_error::{SchemaError, SchemaErrorKind, TaleweaveResult};
use taleweave_gateway::{ChatGateway, ChatOptions, ReasoningEffort, ResponseFormat};
use taleweave_prompt::{
    adapt_messages, intro_insert_messages, parse_reply, planner_messages, substep_messages,
    PlanRevision, PlannerDraft, SubstepBatch,
};
use taleweave_store::BookRepository;
use tracing::{debug, info, instrument, warn};

/// Owns the narrative outline and its cursor.
#[derive(Clone)]
pub struct PlanEngine {
    gateway: Arc<dyn ChatGateway>,
    repo: BookRepository,
    models: ModelSelection,
}

impl PlanEngine {
    /// Create a plan engine.
    pub fn new(gateway: Arc<dyn ChatGateway>, repo: BookRepository, models: ModelSelection) -> Self {
        Self {
            gateway,
            repo,
            models,
        }
    }

    /// Make sure the book has a usable plan and return it.
    ///
    /// Idempotent: a plan whose every point already carries substeps is
    /// returned as-is. Otherwise missing pieces are produced in order
    /// (points, substeps, introduction pass) and persisted as they land.
    #[instrument(skip(self, book), fields(book = %book.id))]
    pub async fn ensure_plan_ready(&self, book: &Book) -> TaleweaveResult<Plan> {
        if let Some(plan) = &book.plan {
            if !plan.points.is_empty() && plan.points.iter().all(|p| !p.substeps.is_empty()) {
                return Ok(plan.clone());
            }
        }

        let mut plan = match &book.plan {
            Some(plan) if !plan.points.is_empty() => plan.clone(),
            _ => self.generate_points(&book.config, &book.id).await?,
        };

        if plan.points.iter().any(|p| p.substeps.is_empty()) {
            plan = self.expand_substeps(&book.config, &book.id, plan).await?;
        }

        // Intro insertion is best-effort; the expanded plan is already usable.
        plan = self.intro_insert(&book.config, &book.id, plan).await;
        Ok(plan)
    }

    async fn generate_points(&self, config: &BookConfig, book_id: &str) -> TaleweaveResult<Plan> {
        let opts = ChatOptions::tagged("plan.points")
            .with_model_opt(self.models.planner.clone())
            .with_effort(ReasoningEffort::Medium)
            .with_response_format(ResponseFormat::JsonObject);
        let reply = self.gateway.chat(&planner_messages(config), &opts).await?;
        let draft: PlannerDraft = parse_reply(&reply)?;
        let draft = draft.validate()?;

        let plan = Plan {
            overall_idea: draft.overall_idea,
            conflict: draft.conflict,
            points: draft
                .points
                .into_iter()
                .map(|p| Point {
                    title: p.title,
                    brief: p.brief,
                    substeps: Vec::new(),
                })
                .collect(),
            cur_point: 0,
            cur_sub: 0,
        };
        self.repo.set_plan(book_id, &plan).await?;
        info!(points = plan.points.len(), "generated plan points");
        Ok(plan)
    }

    async fn expand_substeps(
        &self,
        config: &BookConfig,
        book_id: &str,
        mut plan: Plan,
    ) -> TaleweaveResult<Plan> {
        let opts = ChatOptions::tagged("plan.substeps")
            .with_model_opt(self.models.planner.clone())
            .with_response_format(ResponseFormat::JsonObject);
        let reply = self
            .gateway
            .chat(&substep_messages(config, &plan.points), &opts)
            .await?;
        let batch: SubstepBatch = parse_reply(&reply)?;

        for (index, point) in plan.points.iter_mut().enumerate() {
            if let Some(substeps) = batch.substeps_for(index) {
                point.substeps = substeps;
            }
        }
        if let Some(empty) = plan.points.iter().position(|p| p.substeps.is_empty()) {
            return Err(SchemaError::new(SchemaErrorKind::Invalid {
                field: "substeps",
                reason: format!("point {empty} received no substeps"),
            })
            .into());
        }
        self.repo.set_plan(book_id, &plan).await?;
        info!("expanded plan substeps");
        Ok(plan)
    }

    /// Ask for minimal introduction substeps and apply whatever comes back.
    ///
    /// Non-destructive: a point's list is only replaced when the reply carries
    /// a non-empty list for that index, and any failure leaves the plan alone.
    async fn intro_insert(&self, config: &BookConfig, book_id: &str, mut plan: Plan) -> Plan {
        let opts = ChatOptions::tagged("plan.intro")
            .with_model_opt(self.models.planner.clone())
            .with_response_format(ResponseFormat::JsonObject);
        let reply = match self
            .gateway
            .chat(&intro_insert_messages(config, &plan.points), &opts)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                debug!(error = %err, "intro-insert call failed, keeping substeps");
                return plan;
            }
        };
        let batch: SubstepBatch = match parse_reply(&reply) {
            Ok(batch) => batch,
            Err(err) => {
                debug!(error = %err, "intro-insert reply unusable, keeping substeps");
                return plan;
            }
        };

        for index in 0..plan.points.len() {
            if let Some(substeps) = batch.substeps_for(index) {
                if self
                    .repo
                    .set_point_substeps(book_id, index, &substeps)
                    .await
                    .unwrap_or(false)
                {
                    plan.points[index].substeps = substeps;
                }
            }
        }
        plan
    }

    /// Revise the plan after a reader choice, in the background.
    ///
    /// Never surfaces errors: any failure keeps the prior plan. The
    /// `planUpdating` latch is cleared whatever happens.
    #[instrument(skip(self, committed_page), fields(book = book_id))]
    pub async fn adapt_after_choice(&self, book_id: &str, choice: &str, committed_page: &Page) {
        if let Err(err) = self.repo.set_plan_updating(book_id, true).await {
            warn!(error = %err, "failed to raise planUpdating before adaptation");
        }

        if let Err(err) = self.adapt_inner(book_id, choice, committed_page).await {
            warn!(error = %err, "plan adaptation failed, keeping prior plan");
        }

        if let Err(err) = self.repo.set_plan_updating(book_id, false).await {
            warn!(error = %err, "failed to clear planUpdating after adaptation");
        }
    }

    async fn adapt_inner(
        &self,
        book_id: &str,
        choice: &str,
        committed_page: &Page,
    ) -> TaleweaveResult<()> {
        let book = self.repo.load(book_id).await?;
        let Some(plan) = &book.plan else {
            return Ok(());
        };

        let opts = ChatOptions::tagged("plan.adapt")
            .with_model_opt(self.models.planner.clone())
            .with_effort(ReasoningEffort::Medium)
            .with_response_format(ResponseFormat::JsonObject);
        let reply = self
            .gateway
            .chat(
                &adapt_messages(&book.config, plan, committed_page, choice),
                &opts,
            )
            .await?;
        let revision: PlanRevision = parse_reply(&reply)?;
        let revision = revision.validate()?;

        let revised = Plan {
            overall_idea: revision.overall_idea.clone(),
            conflict: revision.conflict.clone(),
            points: revision.points.iter().map(|p| p.to_point()).collect(),
            cur_point: revision.cur_point,
            cur_sub: revision.cur_sub,
        };
        self.repo.set_plan(book_id, &revised).await?;
        info!(points = revised.points.len(), "plan adapted after choice");

        self.intro_insert(&book.config, book_id, revised).await;
        Ok(())
    }
}
