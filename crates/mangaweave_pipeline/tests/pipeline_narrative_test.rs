//! Tests for the prose-derived stages: story index, anchors, branches,
//! characters and scales.

mod test_utils;

use mangaweave_pipeline::{Stage, StageParams};
use serde_json::{Value, json};
use test_utils::{Fixture, RoutingDriver, seed_summary};

fn anchor(anchor_id: &str, branching_potential: i64) -> Value {
    json!({
        "anchor_id": anchor_id,
        "chapter_id": "ch_001",
        "summary": "Mio takes the map",
        "characters": ["Mio"],
        "cause": "curiosity",
        "immediate_effect": "chase",
        "long_term_impact": "voyage",
        "importance_score": 3,
        "branching_potential": branching_potential,
    })
}

#[tokio::test]
async fn test_story_index_uses_refined_summaries() {
    let fixture = Fixture::new();
    seed_summary(&fixture, "summaries", "ch_001", &["raw event"]).await;
    fixture
        .write_json(
            "summaries",
            "ch_001.summary.refined",
            json!({"chapter_id": "ch_001", "events": ["refined event"]}),
        )
        .await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::StoryIndex, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);

    let prompt = &driver.prompts_with("analyze an entire manga story")[0];
    assert!(prompt.contains("ch_001: Events => refined event"));
    assert!(!prompt.contains("raw event"));

    let index = fixture.read_json("story_index", "story_index").await;
    assert_eq!(index["chapters"][0]["chapter_intent"], "Inciting incident");
    assert_eq!(index["global_arcs"], json!([]));
}

#[tokio::test]
async fn test_anchors_fill_chapter_and_aggregate() {
    let fixture = Fixture::new();
    fixture.write_markdown("novel", "ch_001", "Mio walked the harbor.").await;
    fixture.write_markdown("novel", "full_novel", "# ch_001\n\nMio walked the harbor.").await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Anchors, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);
    assert_eq!(driver.call_count(), 1);

    let per_chapter = fixture.read_json("timeline", "ch_001.anchors").await;
    assert_eq!(per_chapter["anchors"][0]["chapter_id"], "ch_001");

    let all = fixture.read_json("timeline", "anchors").await;
    assert_eq!(all["anchors"].as_array().unwrap().len(), 1);
    assert_eq!(all["anchors"][0]["anchor_id"], "ch_001_a001");
}

#[tokio::test]
async fn test_empty_anchor_list_is_asked_once_more() {
    let fixture = Fixture::new();
    fixture.write_markdown("novel", "ch_001", "Nothing happens.").await;
    let driver = RoutingDriver::happy();
    driver.route("You are a story analyst", r#"{"anchors": []}"#);

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Anchors, &StageParams::default())
        .await
        .unwrap();

    assert_eq!(driver.call_count(), 2);
    assert_eq!(reports[0].succeeded, 1);
    let all = fixture.read_json("timeline", "anchors").await;
    assert_eq!(all["anchors"], json!([]));
}

#[tokio::test]
async fn test_anchors_require_novel_chapters() {
    let fixture = Fixture::new();
    let err = fixture
        .pipeline(&RoutingDriver::happy())
        .run(Stage::Anchors, &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run stage 'novel' first"));
}

#[tokio::test]
async fn test_branches_only_for_pivotal_anchors() {
    let fixture = Fixture::new();
    fixture
        .write_json(
            "timeline",
            "anchors",
            json!({"anchors": [anchor("ch_001_a001", 4), anchor("ch_001_a002", 2)]}),
        )
        .await;
    fixture
        .write_markdown("novel", "full_novel", "# ch_001\n\nMio walked the harbor at dusk.")
        .await;
    let driver = RoutingDriver::happy();
    let pipeline = fixture.pipeline(&driver);

    let reports = pipeline
        .run(Stage::Branches, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);
    assert_eq!(driver.call_count(), 1);

    let prompt = &driver.prompts_with("Narrative Designer")[0];
    assert!(prompt.contains("Mio walked the harbor at dusk."));
    assert!(prompt.contains("ch_001_a001"));

    let suggestions = fixture.read_json("timeline", "branches").await;
    let by_anchor = suggestions["branches_by_anchor"].as_object().unwrap();
    assert_eq!(by_anchor.len(), 1);
    let branches = by_anchor["ch_001_a001"].as_array().unwrap();
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0]["branch_id"], "ch_001_a001_b01");
    assert_eq!(branches[1]["branch_id"], "ch_001_a001_b02");
    assert_eq!(branches[1]["anchor_id"], "ch_001_a001");
    assert_eq!(branches[1]["branch_type"], "BadEnd");

    pipeline
        .run(Stage::Branches, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(driver.call_count(), 1);
    assert_eq!(fixture.read_json("timeline", "branches").await, suggestions);
}

#[tokio::test]
async fn test_branches_require_anchors() {
    let fixture = Fixture::new();
    let err = fixture
        .pipeline(&RoutingDriver::happy())
        .run(Stage::Branches, &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run stage 'anchors' first"));
}

#[tokio::test]
async fn test_characters_write_bible_and_profiles() {
    let fixture = Fixture::new();
    fixture
        .write_markdown("novel", "full_novel", "# ch_001\n\nMio and the guard.")
        .await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Characters, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);

    let bible = fixture.read_json("characters", "characters").await;
    assert_eq!(bible["characters"].as_array().unwrap().len(), 2);

    let mio = fixture.read_json("characters", "c0").await;
    assert_eq!(mio["names"], json!(["Mio"]));
    assert!(fixture.exists_json("characters", "c1").await);

    let requests = driver.requests();
    assert_eq!(requests[0].temperature, Some(0.4));
}

#[tokio::test]
async fn test_existing_bible_fills_missing_profiles() {
    let fixture = Fixture::new();
    fixture
        .write_markdown("novel", "full_novel", "# ch_001\n\nMio and the guard.")
        .await;
    fixture
        .write_json(
            "characters",
            "characters",
            json!({"characters": [
                {"character_id": "c0", "names": ["Mio"], "role": "protagonist"},
                {"character_id": "c1", "names": ["Guard"], "role": "antagonist"}
            ]}),
        )
        .await;
    fixture
        .write_json(
            "characters",
            "c0",
            json!({"character_id": "c0", "names": ["Mio"], "role": "captain"}),
        )
        .await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Characters, &StageParams::default())
        .await
        .unwrap();

    assert_eq!(reports[0].skipped, 1);
    assert_eq!(driver.call_count(), 0);
    let guard = fixture.read_json("characters", "c1").await;
    assert_eq!(guard["names"], json!(["Guard"]));
    assert_eq!(guard["role"], "antagonist");
    let mio = fixture.read_json("characters", "c0").await;
    assert_eq!(mio["role"], "captain");
}

#[tokio::test]
async fn test_characters_require_full_novel() {
    let fixture = Fixture::new();
    let err = fixture
        .pipeline(&RoutingDriver::happy())
        .run(Stage::Characters, &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run stage 'novel' first"));
}

#[tokio::test]
async fn test_scales_rate_each_chapter() {
    let fixture = Fixture::new();
    fixture.write_markdown("novel", "ch_001", "A quiet harbor.").await;
    fixture.write_markdown("novel", "ch_002", "A sword fight.").await;
    fixture.write_markdown("novel", "full_novel", "everything").await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Scales, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 2);
    assert_eq!(driver.call_count(), 2);
    assert!(driver.requests().iter().all(|r| r.temperature == Some(0.2)));

    let by_chapter = fixture.read_json("scales", "scales_by_chapter").await;
    let chapters: Vec<&String> = by_chapter.as_object().unwrap().keys().collect();
    assert_eq!(chapters, vec!["ch_001", "ch_002"]);
    assert_eq!(by_chapter["ch_002"]["chapter_id"], "ch_002");
    assert_eq!(by_chapter["ch_002"]["action_score"], 3);
}

#[tokio::test]
async fn test_out_of_range_scales_degrade() {
    let fixture = Fixture::new();
    fixture.write_markdown("novel", "ch_001", "A quiet harbor.").await;
    let driver = RoutingDriver::happy();
    driver.route(
        "content classifier",
        r#"{"erotism_score": 9, "romance_score": 1, "action_score": 3}"#,
    );

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Scales, &StageParams::default())
        .await
        .unwrap();

    assert_eq!(driver.call_count(), 3);
    assert_eq!(reports[0].degraded.len(), 1);
    assert!(!fixture.exists_json("scales", "ch_001.scales").await);
    assert!(fixture.exists_json("scales", "ch_001.scales.degraded").await);
    assert_eq!(fixture.read_json("scales", "scales_by_chapter").await, json!({}));

    let corrective = &driver.prompts_with("content classifier")[1];
    assert!(corrective.contains("erotism_score"));
}
