//! Scripted chat gateway and service harness for runtime tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taleweave_core::{Book, ChatMessage, Page, Plan, Point, StoryState};
use taleweave_engine::{ModelSelection, PageGenerator, PlanEngine, Verifier};
use taleweave_error::{GatewayError, GatewayErrorKind, TaleweaveResult};
use taleweave_gateway::{ChatGateway, ChatOptions};
use taleweave_runtime::{Coordinator, RuntimeConfig, StoryService};
use taleweave_store::{BookRepository, CommitFields, MemoryStore};

/// One scripted reply for a tag.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Error,
}

/// Chat gateway replaying scripted replies per call tag.
///
/// An unscripted call fails with a transport error, which the background
/// paths swallow by design; tests only script the calls they want to succeed.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<&'static str, VecDeque<ScriptedReply>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, tag: &'static str, reply: impl Into<String>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(tag)
            .or_default()
            .push_back(ScriptedReply::Text(reply.into()));
    }

    pub fn push_error(&self, tag: &'static str) {
        self.scripts
            .lock()
            .unwrap()
            .entry(tag)
            .or_default()
            .push_back(ScriptedReply::Error);
    }

    pub fn call_count(&self, tag: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|t| **t == tag).count()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn chat(&self, _messages: &[ChatMessage], opts: &ChatOptions) -> TaleweaveResult<String> {
        self.calls.lock().unwrap().push(opts.tag);
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(opts.tag)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error) | None => Err(GatewayError::new(
                GatewayErrorKind::Transport("unscripted or failed call".into()),
            )
            .into()),
        }
    }
}

/// Service wired over a memory store and a scripted gateway.
pub struct Harness {
    pub gateway: Arc<ScriptedGateway>,
    pub repo: BookRepository,
    pub service: StoryService,
}

/// Timing constants shrunk for tests: generous staleness, fast polling.
pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        stale: Duration::from_secs(60),
        wait_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
    }
}

pub fn harness(config: RuntimeConfig) -> Harness {
    let gateway = Arc::new(ScriptedGateway::new());
    let repo = BookRepository::new(Arc::new(MemoryStore::new()));
    let models = ModelSelection::gateway_default();
    let plan_engine = PlanEngine::new(gateway.clone(), repo.clone(), models.clone());
    let generator = PageGenerator::new(gateway.clone(), models.clone());
    let verifier = Verifier::new(gateway.clone(), repo.clone(), models);
    let coordinator = Coordinator::new(
        repo.clone(),
        plan_engine.clone(),
        generator.clone(),
        verifier.clone(),
        config,
    );
    let service = StoryService::new(repo.clone(), coordinator, plan_engine, generator, verifier);
    Harness {
        gateway,
        repo,
        service,
    }
}

/// A planner reply with `count` usable points.
pub fn planner_reply(count: usize) -> String {
    let points: Vec<String> = (0..count)
        .map(|i| format!(r#"{{"title":"Point {i}","brief":"brief {i}"}}"#))
        .collect();
    format!(
        r#"{{"overallIdea":"a tale","conflict":"a rift","points":[{}]}}"#,
        points.join(",")
    )
}

/// A substep batch giving every one of `points` three substeps.
pub fn substep_reply(points: usize) -> String {
    let items: Vec<String> = (0..points)
        .map(|i| format!(r#"{{"index":{i},"substeps":["s{i}.0","s{i}.1","s{i}.2"]}}"#))
        .collect();
    format!(r#"{{"items":[{}]}}"#, items.join(","))
}

/// Queue the three plan-bootstrap replies.
pub fn script_plan(gateway: &ScriptedGateway) {
    gateway.push("plan.points", planner_reply(6));
    gateway.push("plan.substeps", substep_reply(6));
    gateway.push("plan.intro", r#"{"items":[]}"#);
}

/// A page reply, optionally carrying three options.
pub fn page_reply(passage: &str, summary: &str, with_options: bool) -> String {
    if with_options {
        format!(
            r#"{{"passage":"{passage}","summary":"{summary}","notes":["note-{summary}"],"options":["go left","go right","wait"]}}"#
        )
    } else {
        format!(r#"{{"passage":"{passage}","summary":"{summary}","notes":["note-{summary}"]}}"#)
    }
}

/// A ready-made plan for tests that seed state directly.
pub fn seeded_plan() -> Plan {
    Plan {
        overall_idea: "a tale".into(),
        conflict: "a rift".into(),
        points: (0..6)
            .map(|i| Point {
                title: format!("Point {i}"),
                brief: format!("brief {i}"),
                substeps: (0..3).map(|j| format!("s{i}.{j}")).collect(),
            })
            .collect(),
        cur_point: 0,
        cur_sub: 0,
    }
}

/// Seed a book with a plan and `pages` committed pages, head at `pages - 1`.
pub async fn seed_book(repo: &BookRepository, pages: usize) -> Book {
    let book = repo.create("owner").await.unwrap();
    repo.set_plan(&book.id, &seeded_plan()).await.unwrap();
    repo.init_story_if_absent(&book.id).await.unwrap();

    if pages > 0 {
        let committed: Vec<Page> = (0..pages)
            .map(|i| Page {
                passage: format!("passage {i}"),
                summary: format!("summary {i}"),
                ..Page::default()
            })
            .collect();
        repo.commit_story(
            &book.id,
            &CommitFields {
                index: pages as i64 - 1,
                notes: vec![],
                summary: committed.last().unwrap().summary.clone(),
                turn: pages as u64,
                pages: committed,
                pending_verify: None,
            },
        )
        .await
        .unwrap();
    }
    repo.load(&book.id).await.unwrap()
}

/// Poll `predicate` over the book until it holds or two seconds pass.
pub async fn wait_for<F>(repo: &BookRepository, book_id: &str, predicate: F) -> Book
where
    F: Fn(&Book) -> bool,
{
    for _ in 0..200 {
        let book = repo.load(book_id).await.unwrap();
        if predicate(&book) {
            return book;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within two seconds");
}

/// The story state of a loaded book.
pub fn story(book: &Book) -> &StoryState {
    book.story.as_ref().expect("book has story state")
}
