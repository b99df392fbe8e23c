//! Scripted chat gateway for engine tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use taleweave_core::ChatMessage;
use taleweave_error::{GatewayError, GatewayErrorKind, TaleweaveResult};
use taleweave_gateway::{ChatGateway, ChatOptions};

/// One scripted reply for a tag.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text
    Text(String),
    /// Fail with a transport error
    Error,
}

/// Chat gateway that replays scripted replies per call tag.
///
/// Each subsystem tags its calls (`plan.points`, `page.generate`, ...), so a
/// test can script every collaborator independently and assert on how often
/// each was called.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<&'static str, VecDeque<ScriptedReply>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply for `tag`.
    pub fn push(&self, tag: &'static str, reply: impl Into<String>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(tag)
            .or_default()
            .push_back(ScriptedReply::Text(reply.into()));
    }

    /// Queue a transport failure for `tag`.
    pub fn push_error(&self, tag: &'static str) {
        self.scripts
            .lock()
            .unwrap()
            .entry(tag)
            .or_default()
            .push_back(ScriptedReply::Error);
    }

    /// How many calls arrived for `tag`.
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
            Some(ScriptedReply::Error) => Err(GatewayError::new(GatewayErrorKind::Transport(
                "scripted failure".into(),
            ))
            .into()),
            None => Err(GatewayError::new(GatewayErrorKind::Transport(format!(
                "no scripted reply for tag {}",
                opts.tag
            )))
            .into()),
        }
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
        .map(|i| {
            format!(
                r#"{{"index":{i},"substeps":["s{i}.0","s{i}.1","s{i}.2"]}}"#
            )
        })
        .collect();
    format!(r#"{{"items":[{}]}}"#, items.join(","))
}

/// A page reply, optionally carrying three options.
pub fn page_reply(passage: &str, summary: &str, with_options: bool) -> String {
    if with_options {
        format!(
            r#"{{"passage":"{passage}","summary":"{summary}","notes":["n1"],"options":["go left","go right","wait"]}}"#
        )
    } else {
        format!(r#"{{"passage":"{passage}","summary":"{summary}","notes":["n1"]}}"#)
    }
}
