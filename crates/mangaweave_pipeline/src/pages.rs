//! Page image discovery, loading and the colour heuristic.

use mangaweave_core::{ImageDetail, Input, MediaSource};
use mangaweave_error::{MangaweaveResult, PipelineError, PipelineErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAGE_EXTENSIONS: &[&str] = &["webp", "png", "jpg", "jpeg"];

/// All page images in `dir`, sorted by file name.
///
/// # Errors
///
/// `PipelineErrorKind::NoPages` when the directory is missing or holds no
/// `webp`, `png`, `jpg` or `jpeg` files.
pub async fn load_all_pages(dir: &Path) -> MangaweaveResult<Vec<PathBuf>> {
    let no_pages = || PipelineError::new(PipelineErrorKind::NoPages(dir.display().to_string()));

    let mut entries = tokio::fs::read_dir(dir).await.map_err(|_| no_pages())?;
    let mut pages = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::new(PipelineErrorKind::Image(e.to_string())))?
    {
        let path = entry.path();
        if is_page_image(&path) {
            pages.push(path);
        }
    }

    if pages.is_empty() {
        return Err(no_pages().into());
    }
    pages.sort();
    debug!(count = pages.len(), dir = %dir.display(), "Found page images");
    Ok(pages)
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// MIME type for a page image path.
pub fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Read a page into an image input.
///
/// # Errors
///
/// `PipelineErrorKind::Image` when the file cannot be read.
pub async fn page_input(path: &Path, detail: ImageDetail) -> MangaweaveResult<Input> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        PipelineError::new(PipelineErrorKind::Image(format!("{}: {}", path.display(), e)))
    })?;
    Ok(Input::Image {
        mime: Some(mime_for(path).to_string()),
        source: MediaSource::Binary(bytes),
        detail,
    })
}

/// Saturation of an RGB pixel in HSV terms, `(max - min) / max`.
fn saturation(r: u8, g: u8, b: u8) -> f32 {
    let max = r.max(g).max(b);
    if max == 0 {
        return 0.0;
    }
    let min = r.min(g).min(b);
    f32::from(max - min) / f32::from(max)
}

/// Fraction of pixels whose saturation exceeds `saturation_threshold`.
pub fn colored_ratio(image: &image::RgbImage, saturation_threshold: f32) -> f32 {
    let total = image.width() as usize * image.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let saturated = image
        .pixels()
        .filter(|p| saturation(p[0], p[1], p[2]) > saturation_threshold)
        .count();
    saturated as f32 / total as f32
}

/// Whether a page is a colour page.
///
/// A page is coloured when more than `ratio_threshold` of its pixels have
/// saturation above `saturation_threshold`. Unreadable images are logged
/// and treated as monochrome.
pub fn is_colored_page(path: &Path, saturation_threshold: f32, ratio_threshold: f32) -> bool {
    match image::open(path) {
        Ok(img) => colored_ratio(&img.to_rgb8(), saturation_threshold) > ratio_threshold,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read image; assuming monochrome");
            false
        }
    }
}

/// Colour flags for every page, computed off the async runtime.
pub async fn colored_flags(
    pages: &[PathBuf],
    saturation_threshold: f32,
    ratio_threshold: f32,
) -> MangaweaveResult<Vec<bool>> {
    let pages = pages.to_vec();
    tokio::task::spawn_blocking(move || {
        pages
            .iter()
            .map(|p| is_colored_page(p, saturation_threshold, ratio_threshold))
            .collect()
    })
    .await
    .map_err(|e| PipelineError::new(PipelineErrorKind::Image(e.to_string())).into())
}
