//! Stage implementations.

mod anchors;
mod branches;
mod chapters;
mod characters;
mod continuation;
mod describe;
mod novel;
mod refine;
mod scales;
mod simulate;
mod story_index;

pub use chapters::{ChapterEntry, ChapterIndex};

use crate::Pipeline;
use crate::keys;
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{Payload, names};
use mangaweave_storage::{ArtifactFormat, ArtifactStore};

/// A chapter summary loaded from the store.
pub(crate) struct LoadedSummary {
    pub(crate) chapter_id: String,
    pub(crate) payload: Payload,
}

impl LoadedSummary {
    pub(crate) fn events(&self) -> Vec<String> {
        self.payload.strings("events")
    }

    pub(crate) fn dialogues(&self) -> Vec<String> {
        self.payload.strings("dialogues")
    }
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Plain chapter summaries in `namespace`, in chapter order.
    ///
    /// With `prefer_refined`, a chapter's refined summary replaces its
    /// plain one when present. Summaries that no longer conform are skipped.
    pub(crate) async fn load_summaries(
        &self,
        namespace: &str,
        prefer_refined: bool,
    ) -> MangaweaveResult<Vec<LoadedSummary>> {
        let shape = self.shape(names::CHAPTER_SUMMARY)?;
        let keys_in_ns = self.list(namespace, ArtifactFormat::Json).await?;

        let mut summaries = Vec::new();
        for chapter_id in keys::summary_chapters(&keys_in_ns) {
            let mut payload = None;
            if prefer_refined {
                payload = self
                    .load_payload(&keys::refined_summary(&chapter_id), &shape)
                    .await?;
            }
            if payload.is_none() {
                payload = self
                    .load_payload(&keys::summary_in(namespace, &chapter_id), &shape)
                    .await?;
            }
            if let Some(payload) = payload {
                summaries.push(LoadedSummary {
                    chapter_id,
                    payload,
                });
            }
        }
        Ok(summaries)
    }
}
