//! Continuing a story past its last chapter.

use super::refine::events_and_dialogues;
use crate::context::tail_chars;
use crate::keys;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError, PipelineErrorKind};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_storage::ArtifactStore;
use tracing::{info, instrument};

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Simulate the chapter after the last one in `timeline` (the main
    /// line when `None`). Each invocation adds at most one chapter.
    #[instrument(skip(self))]
    pub(crate) async fn continue_story(&self, timeline: Option<&str>) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Continue);
        let namespace = timeline.unwrap_or(keys::SUMMARIES);

        let summaries = self.load_summaries(namespace, false).await?;
        let Some(last) = summaries.last() else {
            return Err(PipelineError::missing(
                format!("{}/ch_*.summary.json", namespace),
                Stage::Describe.to_string(),
            )
            .into());
        };
        let next_number = keys::chapter_number(&last.chapter_id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::InvalidChapterId(last.chapter_id.clone())))?
            + 1;
        let chapter_id = keys::chapter_id(next_number);

        let key = keys::summary_in(namespace, &chapter_id);
        if self.store().exists(&key).await? {
            info!(chapter = %chapter_id, "Continuation exists; skipping");
            report.skip();
            return Ok(report);
        }

        let history = events_and_dialogues(&summaries);
        let story_context = tail_chars(&history, self.config().context.story_context_chars);
        info!(
            namespace,
            after = %last.chapter_id,
            chapter = %chapter_id,
            "Continuing story"
        );

        let (document, health) = self
            .simulate_chapter(&chapter_id, story_context, prompts::CONTINUE_HINT)
            .await?;
        self.persist_json(&mut report, &chapter_id, &key, &document, health)
            .await?;
        Ok(report)
    }
}
