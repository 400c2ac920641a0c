//! Prose chapters, synopses and the full novel.

use crate::context::{RollingContext, head_chars};
use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_storage::ArtifactStore;
use tracing::{info, instrument, warn};

const STORY_START: &str = "Story Start.";
const SYNOPSIS_SOURCE_CHARS: usize = 15_000;

fn synopsis_section(chapter_id: &str, synopsis: &str) -> String {
    format!("[Chapter {} Summary]\n{}", chapter_id, synopsis)
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Write each chapter as prose with the story so far in view.
    ///
    /// The rolling context is rebuilt from persisted synopses, so a resumed
    /// run sees exactly what an uninterrupted one would have.
    #[instrument(skip(self))]
    pub(crate) async fn novelize(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Novel);
        let mut chapters: Vec<String> = self
            .chapter_index()
            .await?
            .chapters
            .into_iter()
            .map(|c| c.chapter_id)
            .collect();
        chapters.sort();

        let config = self.config();
        let temperatures = config.generation.temperatures;
        let mut rolling = RollingContext::new(STORY_START, config.context.rolling_chars);

        for chapter_id in &chapters {
            let summary_key = {
                let refined = keys::refined_summary(chapter_id);
                if config.novel.use_refined_summaries && self.store().exists(&refined).await? {
                    refined
                } else {
                    keys::summary(chapter_id)
                }
            };
            if !self.store().exists(&summary_key).await? {
                warn!(chapter = %chapter_id, "Missing summary; skipping chapter");
                continue;
            }

            let prose_key = keys::novel_chapter(chapter_id);
            let synopsis_key = keys::synopsis(chapter_id);
            let have_prose = self.store().exists(&prose_key).await?;

            if have_prose && self.store().exists(&synopsis_key).await? {
                info!(chapter = %chapter_id, "Chapter already novelized; skipping");
                let synopsis = self.store().read_text(&synopsis_key).await?;
                rolling = rolling.append(&synopsis_section(chapter_id, &synopsis));
                report.skip();
                continue;
            }

            let mut health = UnitHealth::default();
            let prose = if have_prose {
                info!(chapter = %chapter_id, "Prose exists; writing missing synopsis");
                Some(self.store().read_text(&prose_key).await?)
            } else {
                info!(chapter = %chapter_id, source = %summary_key, "Novelizing chapter");
                let summary = self.store().read_json(&summary_key).await?;
                let prompt = prompts::prose(chapter_id, &summary, rolling.as_str());
                let result = self
                    .text()
                    .generate_text(&prompt, self.max_attempts(), temperatures.prose)
                    .await;
                let prose = health.text("prose", result);
                if let Some(text) = &prose {
                    self.store().write_text(&prose_key, text).await?;
                }
                prose
            };

            let synopsis = match &prose {
                Some(text) => {
                    let prompt = prompts::synopsis(head_chars(text, SYNOPSIS_SOURCE_CHARS));
                    let result = self
                        .text()
                        .generate_text(&prompt, self.max_attempts(), temperatures.synopsis)
                        .await;
                    health.text("synopsis", result)
                }
                None => None,
            };

            match (synopsis, health.into_reason()) {
                (Some(synopsis), None) => {
                    self.store().write_text(&synopsis_key, &synopsis).await?;
                    rolling = rolling.append(&synopsis_section(chapter_id, &synopsis));
                    report.succeed();
                }
                (_, reason) => {
                    let reason = reason.unwrap_or_else(|| "no synopsis".to_string());
                    warn!(chapter = %chapter_id, reason = %reason, "Chapter degraded");
                    report.fail(chapter_id.as_str(), reason);
                }
            }
        }

        self.write_full_novel(&chapters).await?;
        Ok(report)
    }

    async fn write_full_novel(&self, chapters: &[String]) -> MangaweaveResult<()> {
        let mut full = String::new();
        for chapter_id in chapters {
            let key = keys::novel_chapter(chapter_id);
            if self.store().exists(&key).await? {
                let text = self.store().read_text(&key).await?;
                full.push_str(&format!("# {}\n\n{}\n\n\n", chapter_id, text.trim()));
            }
        }
        let key = keys::full_novel();
        self.store().write_text(&key, &full).await?;
        info!(key = %key, chars = full.len(), "Wrote full novel");
        Ok(())
    }
}
