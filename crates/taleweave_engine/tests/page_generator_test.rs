//! Page generator output-processing tests.

mod test_utils;

use std::sync::Arc;
use taleweave_core::{make_option_id, Book, Plan, Point, StoryState};
use taleweave_engine::{GenerateSpec, ModelSelection, PageGenerator};
use test_utils::{page_reply, ScriptedGateway};

fn plan() -> Plan {
    Plan {
        overall_idea: "i".into(),
        conflict: "c".into(),
        points: vec![Point {
            title: "P0".into(),
            brief: "b".into(),
            substeps: vec!["open on the harbor".into(), "the letter arrives".into()],
        }],
        cur_point: 0,
        cur_sub: 0,
    }
}

fn generator(gateway: Arc<ScriptedGateway>) -> PageGenerator {
    PageGenerator::new(gateway, ModelSelection::gateway_default())
}

#[tokio::test]
async fn opening_page_carries_options_and_sub_to_check() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push("page.generate", page_reply("P0", "s0", true));

    let book = Book::new("owner");
    let spec = GenerateSpec {
        up_to_index: -1,
        option_base_index: 0,
        next_choice: None,
        allow_options: true,
    };
    let candidate = generator(gateway).generate(&book, &plan(), &spec).await.unwrap();

    assert_eq!(candidate.page.passage, "P0");
    let options = candidate.page.options.as_ref().unwrap();
    assert_eq!(options.len(), 3);
    let ids = candidate.page.option_ids.as_ref().unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], make_option_id(0, &options[0]));

    // The opening is a transition window: substep focus is forced, so the
    // candidate must carry the verification tag without moving the cursor.
    let sub = candidate.sub_to_check.unwrap();
    assert_eq!((sub.point_index, sub.sub_index), (0, 0));
    assert_eq!(sub.text, "open on the harbor");
    assert_eq!(candidate.notes_delta, vec!["n1"]);
}

#[tokio::test]
async fn options_dropped_when_not_allowed() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push("page.generate", page_reply("P1", "s1", true));

    let book = Book::new("owner");
    let spec = GenerateSpec {
        up_to_index: -1,
        option_base_index: 0,
        next_choice: None,
        allow_options: false,
    };
    let candidate = generator(gateway).generate(&book, &plan(), &spec).await.unwrap();
    assert!(candidate.page.options.is_none());
    assert!(candidate.page.option_ids.is_none());
}

#[tokio::test]
async fn wrong_option_count_is_discarded() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push(
        "page.generate",
        r#"{"passage":"P","summary":"s","options":["only","two"]}"#,
    );

    let book = Book::new("owner");
    let spec = GenerateSpec {
        up_to_index: -1,
        option_base_index: 0,
        next_choice: None,
        allow_options: true,
    };
    let candidate = generator(gateway).generate(&book, &plan(), &spec).await.unwrap();
    assert!(candidate.page.options.is_none());
}

#[tokio::test]
async fn missing_passage_is_an_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push("page.generate", r#"{"summary":"s"}"#);

    let book = Book::new("owner");
    let spec = GenerateSpec {
        up_to_index: -1,
        option_base_index: 0,
        next_choice: None,
        allow_options: true,
    };
    assert!(generator(gateway).generate(&book, &plan(), &spec).await.is_err());
}

#[tokio::test]
async fn non_json_reply_is_an_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push("page.generate", "the model rambled instead");

    let book = Book::new("owner");
    let spec = GenerateSpec {
        up_to_index: -1,
        option_base_index: 0,
        next_choice: None,
        allow_options: true,
    };
    assert!(generator(gateway).generate(&book, &plan(), &spec).await.is_err());
}

#[tokio::test]
async fn recent_passages_window_is_three_pages() {
    // Generation from index 3 of a 5-page story must not fail on slicing; the
    // window is pages 1..=3.
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push("page.generate", page_reply("P", "s", false));

    let mut book = Book::new("owner");
    let mut story = StoryState::empty();
    for i in 0..5 {
        story.pages.push(taleweave_core::Page {
            passage: format!("passage {i}"),
            summary: format!("summary {i}"),
            ..taleweave_core::Page::default()
        });
    }
    story.index = 4;
    story.summary = "summary 4".into();
    book.story = Some(story);

    let spec = GenerateSpec {
        up_to_index: 3,
        option_base_index: 4,
        next_choice: Some("turn back"),
        allow_options: false,
    };
    let candidate = generator(gateway).generate(&book, &plan(), &spec).await.unwrap();
    assert_eq!(candidate.page.passage, "P");
}
