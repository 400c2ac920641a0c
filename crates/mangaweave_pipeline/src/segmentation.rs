//! Chapter boundary detection.
//!
//! Two signals mark a chapter start: a colour page following a monochrome
//! page, and a vision model confirming a title page. The model is only
//! consulted once a chapter has grown past `min_chapter_pages`, and at most
//! once per `oracle_cooldown` pages.

use crate::pages::mime_for;
use async_trait::async_trait;
use mangaweave_core::ImageDetail;
use mangaweave_error::{MangaweaveResult, PipelineError, PipelineErrorKind};
use mangaweave_generation::GenerationLoop;
use mangaweave_interface::MangaweaveDriver;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

const TITLE_PAGE_PROMPT: &str = "Does this manga page contain a clear Chapter Title or large \
                                 text indicating the start of a new chapter number/title? \
                                 Answer ONLY 'YES' or 'NO'.";

/// Decides whether the page at an index opens a chapter.
#[async_trait]
pub trait TitleOracle: Send + Sync {
    /// Whether page `index` is a chapter title page.
    async fn is_title_page(&self, index: usize) -> MangaweaveResult<bool>;
}

/// Asks the vision model, at low detail, whether a page is a title page.
pub struct VisionTitleOracle<'a, D> {
    generation: &'a GenerationLoop<D>,
    pages: &'a [PathBuf],
}

impl<'a, D: MangaweaveDriver> VisionTitleOracle<'a, D> {
    /// Oracle over `pages`, indexed by position.
    pub fn new(generation: &'a GenerationLoop<D>, pages: &'a [PathBuf]) -> Self {
        Self { generation, pages }
    }
}

#[async_trait]
impl<D: MangaweaveDriver> TitleOracle for VisionTitleOracle<'_, D> {
    async fn is_title_page(&self, index: usize) -> MangaweaveResult<bool> {
        let path = self.pages.get(index).ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::Image(format!("no page at index {}", index)))
        })?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PipelineError::new(PipelineErrorKind::Image(format!("{}: {}", path.display(), e)))
        })?;

        let answer = self
            .generation
            .classify_image(TITLE_PAGE_PROMPT, bytes, mime_for(path), ImageDetail::Low)
            .await?;
        debug!(index, answer = %answer.trim(), "Title page oracle replied");
        Ok(answer.to_uppercase().contains("YES"))
    }
}

/// Two-signal chapter boundary detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryDetector {
    /// Pages since the last boundary before the oracle may be asked
    pub min_chapter_pages: usize,
    /// Pages between two oracle consultations
    pub oracle_cooldown: usize,
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self {
            min_chapter_pages: 15,
            oracle_cooldown: 4,
        }
    }
}

impl BoundaryDetector {
    /// Detector with explicit thresholds.
    pub fn new(min_chapter_pages: usize, oracle_cooldown: usize) -> Self {
        Self {
            min_chapter_pages,
            oracle_cooldown,
        }
    }

    /// Chapter start indices for pages with the given colour flags.
    ///
    /// Always starts with 0 and is strictly increasing. Oracle errors are
    /// logged and read as "not a title page".
    #[instrument(skip_all, fields(pages = colored.len()))]
    pub async fn detect<O: TitleOracle + ?Sized>(&self, colored: &[bool], oracle: &O) -> Vec<usize> {
        let mut boundaries = vec![0];
        let mut last_boundary = 0;
        let mut last_oracle_check = 0;

        for i in 1..colored.len() {
            let is_break = if colored[i] && !colored[i - 1] {
                true
            } else if i - last_boundary > self.min_chapter_pages
                && i - last_oracle_check > self.oracle_cooldown
            {
                last_oracle_check = i;
                match oracle.is_title_page(i).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(index = i, error = %e, "Title page check failed; assuming no break");
                        false
                    }
                }
            } else {
                false
            };

            if is_break {
                info!(index = i, "Detected chapter break");
                boundaries.push(i);
                last_boundary = i;
            }
        }

        boundaries
    }
}

/// Inclusive `(start, end)` page spans for boundaries over `page_count` pages.
///
/// ```
/// use mangaweave_pipeline::chapter_spans;
///
/// assert_eq!(chapter_spans(&[0, 2], 5), vec![(0, 1), (2, 4)]);
/// ```
pub fn chapter_spans(boundaries: &[usize], page_count: usize) -> Vec<(usize, usize)> {
    boundaries
        .iter()
        .enumerate()
        .map(|(k, &start)| {
            let end = boundaries
                .get(k + 1)
                .map(|next| next - 1)
                .unwrap_or(page_count.saturating_sub(1));
            (start, end)
        })
        .collect()
}
