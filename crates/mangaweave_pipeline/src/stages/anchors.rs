//! Plot anchor extraction.

use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::names;
use mangaweave_storage::{ArtifactFormat, ArtifactStore};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

/// Fill missing `chapter_id` of every anchor in an `anchor_list` document.
fn fill_chapter_ids(document: &mut Value, chapter_id: &str) {
    let Some(anchors) = document.get_mut("anchors").and_then(Value::as_array_mut) else {
        return;
    };
    for anchor in anchors {
        let missing = anchor
            .get("chapter_id")
            .and_then(Value::as_str)
            .is_none_or(|id| id.trim().is_empty());
        if missing {
            anchor["chapter_id"] = Value::String(chapter_id.to_string());
        }
    }
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Novel chapter ids, failing when the novel stage has not run.
    pub(crate) async fn novel_chapter_ids(&self) -> MangaweaveResult<Vec<String>> {
        let keys_in_ns = self.list(keys::NOVEL, ArtifactFormat::Markdown).await?;
        let chapters = keys::novel_chapters(&keys_in_ns);
        if chapters.is_empty() {
            return Err(PipelineError::missing(
                format!("{}/ch_*.md", keys::NOVEL),
                Stage::Novel.to_string(),
            )
            .into());
        }
        Ok(chapters)
    }

    /// Extract anchors per prose chapter and aggregate them.
    #[instrument(skip(self))]
    pub(crate) async fn extract_anchors(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Anchors);
        let chapters = self.novel_chapter_ids().await?;
        let shape = self.shape(names::ANCHOR_LIST)?;
        let temperature = self.config().generation.temperatures.anchors;

        for chapter_id in &chapters {
            let key = keys::chapter_anchors(chapter_id);
            if self.store().exists(&key).await? {
                info!(chapter = %chapter_id, "Anchors exist; skipping");
                report.skip();
                continue;
            }

            info!(chapter = %chapter_id, "Extracting anchors");
            let text = self.store().read_text(&keys::novel_chapter(chapter_id)).await?;
            let prompt = prompts::anchors(chapter_id, &text);

            let mut health = UnitHealth::default();
            let mut payload = health.take(
                "anchors",
                self.text()
                    .generate_validated(&prompt, &shape, self.max_attempts(), temperature)
                    .await,
            );
            if health.is_healthy() && payload.list("anchors").is_empty() {
                warn!(chapter = %chapter_id, "No anchors found; asking once more");
                let generated = self
                    .text()
                    .generate_validated(&prompt, &shape, self.max_attempts(), temperature)
                    .await;
                if !generated.is_degraded() {
                    payload = generated.into_payload();
                }
            }

            let mut document = payload.into_value();
            fill_chapter_ids(&mut document, chapter_id);
            self.persist_json(&mut report, chapter_id, &key, &document, health)
                .await?;
        }

        let mut all = Vec::new();
        for chapter_id in &chapters {
            if let Some(list) = self
                .load_payload(&keys::chapter_anchors(chapter_id), &shape)
                .await?
            {
                all.extend(list.list("anchors").iter().cloned());
            }
        }
        let key = keys::anchors();
        info!(key = %key, anchors = all.len(), "Writing anchor aggregate");
        self.store()
            .write_json(&key, &json!({ "anchors": all }))
            .await?;

        Ok(report)
    }
}
