//! Whole-story index.

use crate::context::tail_chars;
use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::names;
use mangaweave_storage::ArtifactStore;
use tracing::{info, instrument};

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Index the whole story from compact chapter summaries.
    #[instrument(skip(self))]
    pub(crate) async fn build_story_index(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::StoryIndex);
        let key = keys::story_index();
        if self.store().exists(&key).await? {
            info!(key = %key, "Story index exists; skipping");
            report.skip();
            return Ok(report);
        }

        let summaries = self.load_summaries(keys::SUMMARIES, true).await?;
        if summaries.is_empty() {
            return Err(PipelineError::missing(
                format!("{}/ch_*.summary.json", keys::SUMMARIES),
                Stage::Describe.to_string(),
            )
            .into());
        }

        let compact = summaries
            .iter()
            .map(|s| {
                format!(
                    "{}: Events => {}\nDialogues => {}",
                    s.chapter_id,
                    s.events().join(" | "),
                    s.dialogues().join(" | ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let compact = tail_chars(&compact, self.config().context.story_index_chars);

        info!(chapters = summaries.len(), "Building story index");
        let shape = self.shape(names::STORY_INDEX)?;
        let generated = self
            .text()
            .generate_validated(
                &prompts::story_index(compact),
                &shape,
                self.max_attempts(),
                self.config().generation.temperatures.story_index,
            )
            .await;

        let mut health = UnitHealth::default();
        let document = health.take("story index", generated).into_value();
        self.persist_json(&mut report, "story_index", &key, &document, health)
            .await?;
        Ok(report)
    }
}
