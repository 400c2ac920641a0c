//! Character bible.

use crate::context::tail_chars;
use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::names;
use mangaweave_storage::ArtifactStore;
use serde_json::Value;
use tracing::{info, instrument};

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Build the character bible from the tail of the full novel.
    ///
    /// Writes the bible plus one file per character. Profiles missing next
    /// to an existing bible are filled in from it.
    #[instrument(skip(self))]
    pub(crate) async fn build_character_bible(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Characters);
        let novel_key = keys::full_novel();
        self.require(&novel_key, Stage::Novel).await?;

        let key = keys::characters();
        let shape = self.shape(names::CHARACTER_BIBLE)?;
        if self.store().exists(&key).await? {
            info!(key = %key, "Character bible exists; skipping");
            report.skip();
            if let Some(bible) = self.load_payload(&key, &shape).await? {
                self.write_character_profiles(bible.list("characters")).await?;
            }
            return Ok(report);
        }

        let novel = self.store().read_text(&novel_key).await?;
        let config = self.config();
        let source = tail_chars(&novel, config.context.character_context_chars);
        info!(chars = source.chars().count(), "Building character bible");

        let mut health = UnitHealth::default();
        let bible = health.take(
            "character bible",
            self.text()
                .generate_validated(
                    &prompts::characters(source),
                    &shape,
                    self.max_attempts(),
                    config.generation.temperatures.characters,
                )
                .await,
        );

        let written = self
            .persist_json(&mut report, "characters", &key, &bible.to_value(), health)
            .await?;
        if written {
            self.write_character_profiles(bible.list("characters")).await?;
        }
        Ok(report)
    }

    /// Write `characters/{id}.json` for every character whose file is missing.
    async fn write_character_profiles(&self, characters: &[Value]) -> MangaweaveResult<()> {
        let mut written = 0;
        for character in characters {
            let character_id = character
                .get("character_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            let key = keys::character(character_id);
            if self.store().exists(&key).await? {
                continue;
            }
            self.store().write_json(&key, character).await?;
            written += 1;
        }
        if written > 0 {
            info!(written, total = characters.len(), "Wrote character files");
        }
        Ok(())
    }
}
