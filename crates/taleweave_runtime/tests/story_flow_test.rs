//! End-to-end story flows: cold start, cached next, choice adaptation.

mod test_utils;

use taleweave_core::make_option_id;
use taleweave_runtime::ChooseRequest;
use test_utils::{harness, page_reply, script_plan, story, test_config, wait_for};

#[tokio::test]
async fn cold_start_commits_opening_page_and_precomputes_next() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    // The background precompute of the linear continuation.
    h.gateway.push("page.generate", page_reply("P1", "s1", false));

    let snapshot = h.service.start(&book.id).await.unwrap();
    assert_eq!(snapshot.pages.len(), 1);
    assert_eq!(snapshot.pages[0].passage, "P0");
    assert_eq!(snapshot.index, 0);
    assert_eq!(snapshot.notes, vec!["note-s0"]);
    assert_eq!(snapshot.turn, 1);

    let book = wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key("0:__next__")
    })
    .await;
    let cached = &story(&book).branch_cache["0:__next__"];
    assert_eq!(cached.page.passage, "P1");
    assert_eq!(h.gateway.call_count("page.generate"), 2);
}

#[tokio::test]
async fn start_is_idempotent_once_pages_exist() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.service.start(&book.id).await.unwrap();

    let again = h.service.start(&book.id).await.unwrap();
    assert_eq!(again.pages.len(), 1);
    assert_eq!(h.gateway.call_count("plan.points"), 1);
}

#[tokio::test]
async fn linear_next_commits_from_cache_without_generating() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.gateway.push("page.generate", page_reply("P1", "s1", false));
    h.service.start(&book.id).await.unwrap();
    wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key("0:__next__")
    })
    .await;
    let generated_before = h.gateway.call_count("page.generate");

    // The precompute of the new head, scripted ahead of the commit.
    h.gateway.push("page.generate", page_reply("P2", "s2", false));

    let snapshot = h.service.next(&book.id, 0).await.unwrap();
    assert_eq!(snapshot.index, 1);
    assert_eq!(snapshot.pages[1].passage, "P1");
    assert_eq!(snapshot.turn, 2);

    // The commit itself spent no generation; the cached entry is consumed.
    let book_now = h.repo.load(&book.id).await.unwrap();
    assert!(!story(&book_now).branch_cache.contains_key("0:__next__"));

    let book_now = wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key("1:__next__")
    })
    .await;
    assert_eq!(story(&book_now).branch_cache["1:__next__"].page.passage, "P2");
    assert!(h.gateway.call_count("page.generate") >= generated_before + 1);
}

#[tokio::test]
async fn choice_commit_adapts_plan_then_precomputes() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    // Opening page offers choices; its option branches precompute eagerly.
    h.gateway.push("page.generate", page_reply("P0", "s0", true));
    for i in 1..=4 {
        h.gateway
            .push("page.generate", page_reply(&format!("B{i}"), &format!("sb{i}"), false));
    }
    h.service.start(&book.id).await.unwrap();

    let option_id = make_option_id(0, "go right");
    let option_key = format!("0:{option_id}");
    let book_ready = wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key(&option_key)
            && story(b).branch_cache.contains_key("0:__next__")
    })
    .await;
    let cached_passage = story(&book_ready).branch_cache[&option_key].page.passage.clone();

    // Script the adaptation and the deferred precompute of the new head.
    h.gateway.push(
        "plan.adapt",
        r#"{"overallIdea":"revised","conflict":"sharper","points":[
            {"title":"A","brief":"a","substeps":["1","2"]},
            {"title":"B","brief":"b","substeps":["1"]},
            {"title":"C","brief":"c","substeps":["1"]}
        ],"curPoint":0,"curSub":0}"#,
    );
    h.gateway.push("plan.intro", r#"{"items":[]}"#);
    h.gateway.push("page.generate", page_reply("P2", "s2", false));

    let request = ChooseRequest {
        index: 0,
        option_id: Some(option_id.clone()),
        text: None,
    };
    let snapshot = h.service.choose(&book.id, &request).await.unwrap();
    assert_eq!(snapshot.index, 1);
    assert_eq!(snapshot.pages[1].passage, cached_passage);

    // The latch is up before the response is out.
    let book_now = h.repo.load(&book.id).await.unwrap();
    assert!(book_now.plan_updating);

    // Precompute of the new head only lands after adaptation replaced the
    // plan and dropped the latch.
    let book_done = wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key("1:__next__")
    })
    .await;
    assert!(!book_done.plan_updating);
    assert_eq!(book_done.plan.as_ref().unwrap().overall_idea, "revised");
}

#[tokio::test]
async fn choice_falls_back_to_free_text_generation() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.service.start(&book.id).await.unwrap();

    // No cached branch for free text: the commit generates synchronously.
    h.gateway.push("page.generate", page_reply("P1", "s1", false));

    let request = ChooseRequest {
        index: 0,
        option_id: None,
        text: Some("smash the lantern".into()),
    };
    let snapshot = h.service.choose(&book.id, &request).await.unwrap();
    assert_eq!(snapshot.index, 1);
    assert_eq!(snapshot.pages[1].passage, "P1");
}

#[tokio::test]
async fn choice_without_usable_text_is_rejected() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.service.start(&book.id).await.unwrap();

    let request = ChooseRequest {
        index: 0,
        option_id: Some("0-deadbeef".into()),
        text: Some("   ".into()),
    };
    assert!(h.service.choose(&book.id, &request).await.is_err());
}

#[tokio::test]
async fn next_validates_index_range() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.service.start(&book.id).await.unwrap();

    assert!(h.service.next(&book.id, 5).await.is_err());
    assert!(h.service.next(&book.id, -2).await.is_err());
}

#[tokio::test]
async fn forward_cache_is_pruned_on_commit() {
    let h = harness(test_config());
    let book = h.repo.create("owner").await.unwrap();

    script_plan(&h.gateway);
    h.gateway.push("page.generate", page_reply("P0", "s0", false));
    h.gateway.push("page.generate", page_reply("P1", "s1", false));
    h.service.start(&book.id).await.unwrap();
    wait_for(&h.repo, &book.id, |b| {
        story(b).branch_cache.contains_key("0:__next__")
    })
    .await;

    // Plant a stray forward entry well ahead of the head.
    let far = taleweave_core::BranchKey::next(7);
    h.repo.try_claim(&book.id, &far, 1).await.unwrap();
    h.repo
        .store_candidate(
            &book.id,
            &far,
            &taleweave_core::Candidate {
                page: taleweave_core::Page {
                    passage: "stray".into(),
                    summary: "stray".into(),
                    ..taleweave_core::Page::default()
                },
                notes_delta: vec![],
                sub_to_check: None,
            },
            1,
        )
        .await
        .unwrap();

    h.gateway.push("page.generate", page_reply("P2", "s2", false));
    let snapshot = h.service.next(&book.id, 0).await.unwrap();
    assert_eq!(snapshot.index, 1);

    let book_now = h.repo.load(&book.id).await.unwrap();
    for key in story(&book_now).branch_cache.keys() {
        let parsed: taleweave_core::BranchKey = key.parse().unwrap();
        assert!(parsed.index <= 1, "forward key survived prune: {key}");
    }
}
