//! Chapter descriptions from page images.

use crate::context::head_chars;
use crate::keys;
use crate::pages::page_input;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_core::ImageDetail;
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{Payload, names, validate_value};
use mangaweave_storage::ArtifactStore;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{info, instrument};

/// Running fold of page batch descriptions into one chapter summary.
#[derive(Debug, Default)]
pub(crate) struct ChapterAccumulator {
    events: Vec<String>,
    dialogues: Vec<String>,
    setting: String,
    atmosphere: String,
    page_summaries: Vec<Value>,
}

impl ChapterAccumulator {
    /// Fold one batch whose first page is chapter page `first_page` (1-based).
    ///
    /// Page summaries are renumbered by absolute chapter page.
    pub(crate) fn fold(&mut self, batch: &Payload, first_page: usize) {
        self.events.extend(batch.strings("events"));
        self.dialogues.extend(batch.strings("dialogues"));

        for (offset, item) in batch.list("page_summaries").iter().enumerate() {
            let text = item.get("text").and_then(Value::as_str).unwrap_or_default();
            self.page_summaries.push(json!({
                "page_number": first_page + offset,
                "text": text,
            }));
        }

        if let Some(visual) = batch.get("visual_details") {
            merge_visual(&mut self.setting, visual.get("setting"));
            merge_visual(&mut self.atmosphere, visual.get("atmosphere"));
        }
    }

    pub(crate) fn events(&self) -> &[String] {
        &self.events
    }

    pub(crate) fn page_summaries(&self) -> &[Value] {
        &self.page_summaries
    }

    pub(crate) fn set_visual(&mut self, setting: &str, atmosphere: &str) {
        self.setting = setting.to_string();
        self.atmosphere = atmosphere.to_string();
    }

    /// The "story so far" handed to the next batch.
    pub(crate) fn story_so_far(&self, chapter_id: &str) -> String {
        format!(
            "Key events so far in chapter {}: {}\nKey dialogues so far: {}",
            chapter_id,
            head_chars(&self.events.join(", "), 2000),
            head_chars(&self.dialogues.join(", "), 2000),
        )
    }

    pub(crate) fn into_document(self, chapter_id: &str) -> Value {
        json!({
            "chapter_id": chapter_id,
            "events": self.events,
            "dialogues": self.dialogues,
            "visual_details": {
                "setting": self.setting,
                "atmosphere": self.atmosphere,
            },
            "page_summaries": self.page_summaries,
        })
    }
}

/// Empty takes the new value; otherwise append it when not already contained.
fn merge_visual(existing: &mut String, incoming: Option<&Value>) {
    let Some(value) = incoming.and_then(Value::as_str).filter(|v| !v.is_empty()) else {
        return;
    };
    if existing.is_empty() {
        *existing = value.to_string();
    } else if !existing.contains(value) {
        existing.push(' ');
        existing.push_str(value);
    }
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Describe every chapter from its pages, one vision call per batch.
    #[instrument(skip(self))]
    pub(crate) async fn describe_chapters(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Describe);
        let index = self.chapter_index().await?;
        let batch_shape = self.shape(names::PAGE_BATCH)?;
        let summary_shape = self.shape(names::CHAPTER_SUMMARY)?;
        let batch_size = self.config().batch.page_batch_size.max(1);
        let temperature = self.config().generation.temperatures.describe;

        for chapter in &index.chapters {
            let chapter_id = chapter.chapter_id.as_str();
            let key = keys::summary(chapter_id);
            if self.store().exists(&key).await? {
                info!(chapter = chapter_id, "Summary exists; skipping");
                report.skip();
                continue;
            }

            let pages: Vec<PathBuf> = chapter.pages.iter().map(PathBuf::from).collect();
            let total = pages.len();
            info!(chapter = chapter_id, pages = total, "Describing chapter");

            let mut health = UnitHealth::default();
            let mut chapter_summary = ChapterAccumulator::default();
            let mut story_so_far = prompts::CHAPTER_START.to_string();

            for (batch_no, batch) in pages.chunks(batch_size).enumerate() {
                let first_page = batch_no * batch_size + 1;
                let last_page = first_page + batch.len() - 1;

                let mut images = Vec::with_capacity(batch.len());
                for path in batch {
                    match page_input(path, ImageDetail::High).await {
                        Ok(input) => images.push(input),
                        Err(e) => health.note(e.to_string()),
                    }
                }
                if !health.is_healthy() {
                    break;
                }

                info!(chapter = chapter_id, first_page, last_page, "Describing pages");
                let prompt =
                    prompts::describe_batch(chapter_id, &story_so_far, first_page, last_page, total);
                let generated = self
                    .vision()
                    .generate_validated_with_images(
                        &prompt,
                        &images,
                        &batch_shape,
                        self.max_attempts(),
                        temperature,
                    )
                    .await;
                let payload =
                    health.take(&format!("pages {}-{}", first_page, last_page), generated);

                chapter_summary.fold(&payload, first_page);
                story_so_far = chapter_summary.story_so_far(chapter_id);
            }

            let document = chapter_summary.into_document(chapter_id);
            let document = match validate_value(&document, &summary_shape) {
                Ok(payload) => payload.into_value(),
                Err(e) => {
                    health.note(e.listing());
                    document
                }
            };
            self.persist_json(&mut report, chapter_id, &key, &document, health)
                .await?;
        }

        Ok(report)
    }
}
