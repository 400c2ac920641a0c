//! Tests for the source-facing stages: chapters, describe, refine and novel.

mod test_utils;

use image::{Rgb, RgbImage};
use mangaweave_core::{ImageDetail, Input};
use mangaweave_pipeline::{Stage, StageParams};
use test_utils::{Fixture, RoutingDriver, seed_summary};

fn write_pages(fixture: &Fixture, count: usize, colored: &[usize]) {
    for i in 0..count {
        let pixel = if colored.contains(&i) {
            Rgb([210, 40, 40])
        } else {
            Rgb([128, 128, 128])
        };
        RgbImage::from_pixel(8, 8, pixel)
            .save(fixture.pages_dir().join(format!("{:03}.png", i)))
            .unwrap();
    }
}

#[tokio::test]
async fn test_chapters_split_on_colour_pages() {
    let fixture = Fixture::new();
    write_pages(&fixture, 20, &[0, 16]);
    let driver = RoutingDriver::happy();
    let pipeline = fixture.pipeline(&driver);

    let reports = pipeline
        .run(Stage::Chapters, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);

    let index = fixture.read_json("chapters", "chapters_index").await;
    let chapters = index["chapters"].as_array().unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0]["chapter_id"], "ch_001");
    assert_eq!(chapters[0]["start_idx"], 0);
    assert_eq!(chapters[0]["end_idx"], 15);
    assert_eq!(chapters[1]["start_idx"], 16);
    assert_eq!(chapters[1]["end_idx"], 19);
    assert_eq!(chapters[1]["pages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_chapters_consult_title_oracle_after_minimum_length() {
    let fixture = Fixture::new();
    write_pages(&fixture, 24, &[]);
    let driver = RoutingDriver::happy();
    driver.route("Chapter Title or large", "YES, this is a title page.");
    let pipeline = fixture.pipeline(&driver);

    pipeline
        .run(Stage::Chapters, &StageParams::default())
        .await
        .unwrap();

    let index = fixture.read_json("chapters", "chapters_index").await;
    let starts: Vec<u64> = index["chapters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["start_idx"].as_u64().unwrap())
        .collect();
    assert_eq!(starts, vec![0, 16]);

    let requests = driver.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].image_count(), 1);
    assert_eq!(requests[0].temperature, Some(0.0));
}

#[tokio::test]
async fn test_chapters_without_pages_is_an_error() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(&RoutingDriver::happy());

    let err = pipeline
        .run(Stage::Chapters, &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No page images"));
}

#[tokio::test]
async fn test_describe_folds_page_batches() {
    let mut fixture = Fixture::new();
    fixture.config.batch.page_batch_size = 2;
    fixture.seed_chapters(&[3]).await;
    let driver = RoutingDriver::happy();
    let pipeline = fixture.pipeline(&driver);

    let reports = pipeline
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);
    assert!(reports[0].is_clean());

    let requests = driver.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].image_count(), 2);
    assert_eq!(requests[1].image_count(), 1);
    assert_eq!(
        requests[0].model.as_deref(),
        Some(fixture.config.models.vision_model.as_str())
    );
    let details: Vec<ImageDetail> = requests[0].messages[0]
        .content
        .iter()
        .filter_map(|i| match i {
            Input::Image { detail, .. } => Some(*detail),
            _ => None,
        })
        .collect();
    assert_eq!(details, vec![ImageDetail::High, ImageDetail::High]);

    let prompts = driver.prompts_with("expert manga analyst");
    assert!(prompts[0].contains("no prior pages have been summarized"));
    assert!(prompts[1].contains("Key events so far in chapter ch_001: Mio finds the map"));
    assert!(prompts[1].contains("ONLY pages 3-3 out of 3"));

    let summary = fixture.read_json("summaries", "ch_001.summary").await;
    assert_eq!(summary["chapter_id"], "ch_001");
    assert_eq!(summary["events"].as_array().unwrap().len(), 2);
    let numbers: Vec<u64> = summary["page_summaries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page_number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(summary["visual_details"]["setting"], "harbor");
}

#[tokio::test]
async fn test_rerun_skips_existing_units_without_calls() {
    let fixture = Fixture::new();
    fixture.seed_chapters(&[2, 2]).await;
    let driver = RoutingDriver::happy();
    let pipeline = fixture.pipeline(&driver);

    pipeline
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap();
    let calls = driver.call_count();
    let first = fixture.read_json("summaries", "ch_002.summary").await;

    let reports = pipeline
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap();

    assert_eq!(driver.call_count(), calls);
    assert_eq!(reports[0].skipped, 2);
    assert_eq!(reports[0].succeeded, 0);
    assert_eq!(fixture.read_json("summaries", "ch_002.summary").await, first);
}

#[tokio::test]
async fn test_degraded_unit_is_quarantined_and_retried() {
    let fixture = Fixture::new();
    fixture.seed_chapters(&[2]).await;
    let broken = RoutingDriver::happy();
    broken.route("expert manga analyst", "I cannot read these pages.");

    let reports = fixture
        .pipeline(&broken)
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap();

    assert_eq!(broken.call_count(), 3);
    assert_eq!(reports[0].degraded.len(), 1);
    assert_eq!(reports[0].degraded[0].unit, "ch_001");
    assert!(!fixture.exists_json("summaries", "ch_001.summary").await);
    assert!(fixture.exists_json("summaries", "ch_001.summary.degraded").await);

    let healthy = RoutingDriver::happy();
    let reports = fixture
        .pipeline(&healthy)
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 1);
    assert!(fixture.exists_json("summaries", "ch_001.summary").await);
}

#[tokio::test]
async fn test_describe_requires_chapter_index() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(&RoutingDriver::happy());

    let err = pipeline
        .run(Stage::Describe, &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("run stage 'chapters' first"));
}

#[tokio::test]
async fn test_refine_keeps_chapter_id() {
    let fixture = Fixture::new();
    seed_summary(&fixture, "summaries", "ch_001", &["Mio finds the map"]).await;
    seed_summary(&fixture, "summaries", "ch_002", &["The guard gives chase"]).await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Refine, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 2);

    let refined = fixture.read_json("summaries", "ch_002.summary.refined").await;
    assert_eq!(refined["chapter_id"], "ch_002");
    assert_eq!(refined["events"][0], "Mio steals the map");

    let prompt = &driver.prompts_with("refining an earlier interpretation")[0];
    assert!(prompt.contains("CHAPTER ch_002:\n  Events: The guard gives chase"));
}

#[tokio::test]
async fn test_novel_carries_rolling_context() {
    let fixture = Fixture::new();
    fixture.seed_chapters(&[1, 1]).await;
    seed_summary(&fixture, "summaries", "ch_001", &["Mio finds the map"]).await;
    seed_summary(&fixture, "summaries", "ch_002", &["The guard gives chase"]).await;
    let driver = RoutingDriver::happy();

    let reports = fixture
        .pipeline(&driver)
        .run(Stage::Novel, &StageParams::default())
        .await
        .unwrap();
    assert_eq!(reports[0].succeeded, 2);

    let prose_prompts = driver.prompts_with("light-novel writer");
    assert_eq!(prose_prompts.len(), 2);
    assert!(prose_prompts[0].contains("STORY SO FAR:\nStory Start."));
    assert!(prose_prompts[1].contains("[Chapter ch_001 Summary]\nMio took the map."));

    let full = std::fs::read_to_string(fixture.artifact_path("novel/full_novel.md")).unwrap();
    assert!(full.starts_with("# ch_001\n\nMio walked the harbor at dusk."));
    assert!(full.contains("# ch_002"));
    assert!(fixture.artifact_path("novel/ch_002.synopsis.txt").exists());
}

#[tokio::test]
async fn test_novel_prefers_refined_summaries() {
    let fixture = Fixture::new();
    fixture.seed_chapters(&[1]).await;
    seed_summary(&fixture, "summaries", "ch_001", &["raw event"]).await;
    fixture
        .write_json(
            "summaries",
            "ch_001.summary.refined",
            serde_json::json!({"chapter_id": "ch_001", "events": ["refined event"]}),
        )
        .await;
    let driver = RoutingDriver::happy();

    fixture
        .pipeline(&driver)
        .run(Stage::Novel, &StageParams::default())
        .await
        .unwrap();

    let prompt = &driver.prompts_with("light-novel writer")[0];
    assert!(prompt.contains("refined event"));
    assert!(!prompt.contains("raw event"));
}

#[tokio::test]
async fn test_unknown_stage_name() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(&RoutingDriver::happy());

    let err = pipeline
        .run_named("paint", &StageParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown stage: paint"));
}

#[tokio::test]
async fn test_all_stops_at_first_failing_stage() {
    let fixture = Fixture::new();
    let driver = RoutingDriver::happy();

    let err = fixture
        .pipeline(&driver)
        .run(Stage::All, &StageParams::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("No page images"));
    assert_eq!(driver.call_count(), 0);
}
