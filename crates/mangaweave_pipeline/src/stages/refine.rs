//! Summary refinement with whole-story context.

use crate::context::tail_chars;
use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::stages::LoadedSummary;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::names;
use mangaweave_storage::ArtifactStore;
use serde_json::Value;
use tracing::{info, instrument};

/// "CHAPTER id:\n  Events: ..\n  Dialogues: .." blocks, blank-line separated.
pub(crate) fn events_and_dialogues(summaries: &[LoadedSummary]) -> String {
    summaries
        .iter()
        .map(|s| {
            format!(
                "CHAPTER {}:\n  Events: {}\n  Dialogues: {}",
                s.chapter_id,
                s.events().join("; "),
                s.dialogues().join("; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Re-read every chapter summary against the whole story and write a corrected copy.
    #[instrument(skip(self))]
    pub(crate) async fn refine_summaries(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Refine);
        let summaries = self.load_summaries(keys::SUMMARIES, false).await?;
        if summaries.is_empty() {
            return Err(PipelineError::missing(
                format!("{}/ch_*.summary.json", keys::SUMMARIES),
                Stage::Describe.to_string(),
            )
            .into());
        }

        let shape = self.shape(names::CHAPTER_SUMMARY)?;
        let global = events_and_dialogues(&summaries);
        let global = tail_chars(&global, self.config().context.global_context_chars);
        let temperature = self.config().generation.temperatures.refine;

        for summary in &summaries {
            let chapter_id = summary.chapter_id.as_str();
            let key = keys::refined_summary(chapter_id);
            if self.store().exists(&key).await? {
                info!(chapter = chapter_id, "Refined summary exists; skipping");
                report.skip();
                continue;
            }

            info!(chapter = chapter_id, "Refining summary");
            let prompt = prompts::refine(chapter_id, &summary.payload.to_value(), global);
            let generated = self
                .text()
                .generate_validated(&prompt, &shape, self.max_attempts(), temperature)
                .await;

            let mut health = UnitHealth::default();
            let mut document = health.take("refinement", generated).into_value();
            document["chapter_id"] = Value::String(chapter_id.to_string());
            self.persist_json(&mut report, chapter_id, &key, &document, health)
                .await?;
        }

        Ok(report)
    }
}
