//! Chapter content ratings.

use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::names;
use mangaweave_storage::ArtifactStore;
use serde_json::{Map, Value};
use tracing::{info, instrument};

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Rate every prose chapter and aggregate the ratings by chapter.
    #[instrument(skip(self))]
    pub(crate) async fn rate_chapters(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Scales);
        let chapters = self.novel_chapter_ids().await?;
        let shape = self.shape(names::CHAPTER_SCALES)?;
        let config = self.config();

        for chapter_id in &chapters {
            let key = keys::chapter_scales(chapter_id);
            if self.store().exists(&key).await? {
                info!(chapter = %chapter_id, "Scales exist; skipping");
                report.skip();
                continue;
            }

            info!(chapter = %chapter_id, "Rating chapter");
            let text = self.store().read_text(&keys::novel_chapter(chapter_id)).await?;
            let prompt = prompts::scales(chapter_id, &text, &config.scales);

            let mut health = UnitHealth::default();
            let mut document = health
                .take(
                    "scales",
                    self.text()
                        .generate_validated(
                            &prompt,
                            &shape,
                            self.max_attempts(),
                            config.generation.temperatures.scales,
                        )
                        .await,
                )
                .into_value();
            document["chapter_id"] = Value::String(chapter_id.clone());
            self.persist_json(&mut report, chapter_id, &key, &document, health)
                .await?;
        }

        let mut by_chapter = Map::new();
        for chapter_id in &chapters {
            if let Some(scales) = self
                .load_payload(&keys::chapter_scales(chapter_id), &shape)
                .await?
            {
                by_chapter.insert(chapter_id.clone(), scales.into_value());
            }
        }
        let key = keys::scales_by_chapter();
        info!(key = %key, chapters = by_chapter.len(), "Writing scales aggregate");
        self.store().write_json(&key, &Value::Object(by_chapter)).await?;

        Ok(report)
    }
}
