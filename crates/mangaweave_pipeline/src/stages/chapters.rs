//! Chapter segmentation.

use crate::keys;
use crate::pages::{colored_flags, load_all_pages};
use crate::segmentation::{BoundaryDetector, VisionTitleOracle, chapter_spans};
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{JsonError, MangaweaveResult};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_storage::ArtifactStore;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// One detected chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterEntry {
    /// `ch_NNN`, numbered from 1
    pub chapter_id: String,
    /// Index of the first page in the full sequence
    pub start_idx: usize,
    /// Index of the last page, inclusive
    pub end_idx: usize,
    /// Page image paths of this chapter, in reading order
    #[serde(default)]
    pub pages: Vec<String>,
}

/// The `chapters/chapters_index.json` document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterIndex {
    /// Chapters in page order
    pub chapters: Vec<ChapterEntry>,
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Detect chapter boundaries over the page directory and write the index.
    #[instrument(skip(self))]
    pub(crate) async fn segment_chapters(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Chapters);
        let key = keys::chapter_index();
        if self.store().exists(&key).await? {
            info!(key = %key, "Chapter index exists; skipping segmentation");
            report.skip();
            return Ok(report);
        }

        let config = self.config();
        let pages = load_all_pages(&config.paths.pages_dir).await?;
        info!(pages = pages.len(), dir = %config.paths.pages_dir.display(), "Segmenting pages");

        let segmentation = &config.segmentation;
        let colored = colored_flags(
            &pages,
            segmentation.saturation_threshold,
            segmentation.colored_ratio_threshold,
        )
        .await?;

        let detector =
            BoundaryDetector::new(segmentation.min_chapter_pages, segmentation.oracle_cooldown);
        let oracle = VisionTitleOracle::new(self.vision(), &pages);
        let boundaries = detector.detect(&colored, &oracle).await;

        let chapters = chapter_spans(&boundaries, pages.len())
            .into_iter()
            .enumerate()
            .map(|(k, (start_idx, end_idx))| ChapterEntry {
                chapter_id: keys::chapter_id(k as u32 + 1),
                start_idx,
                end_idx,
                pages: pages[start_idx..=end_idx]
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect(),
            })
            .collect::<Vec<_>>();

        info!(chapters = chapters.len(), "Segmented pages into chapters");
        let index = ChapterIndex { chapters };
        let value = serde_json::to_value(&index)
            .map_err(|e| JsonError::new(format!("Failed to serialize chapter index: {}", e)))?;
        self.store().write_json(&key, &value).await?;
        report.succeed();
        Ok(report)
    }

    /// Read the chapter index written by the chapters stage.
    pub(crate) async fn chapter_index(&self) -> MangaweaveResult<ChapterIndex> {
        let key = keys::chapter_index();
        self.require(&key, Stage::Chapters).await?;
        let value = self.store().read_json(&key).await?;
        let index: ChapterIndex = serde_json::from_value(value)
            .map_err(|e| JsonError::new(format!("Malformed chapter index: {}", e)))?;
        Ok(index)
    }
}
