//! Input types for generation requests.

use crate::{ImageDetail, MediaSource};
use serde::{Deserialize, Serialize};

/// Supported inputs to a generation driver.
///
/// # Examples
///
/// ```
/// use mangaweave_core::{ImageDetail, Input, MediaSource};
///
/// let text = Input::Text("Describe these pages.".to_string());
///
/// let page = Input::Image {
///     mime: Some("image/webp".to_string()),
///     source: MediaSource::Binary(vec![0x52, 0x49, 0x46, 0x46]),
///     detail: ImageDetail::High,
/// };
/// assert!(page.is_image());
/// assert!(!text.is_image());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP).
    Image {
        /// MIME type, e.g., "image/png" or "image/webp"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
        /// Requested resolution
        #[serde(default)]
        detail: ImageDetail,
    },
}

impl Input {
    /// True for image inputs.
    pub fn is_image(&self) -> bool {
        matches!(self, Input::Image { .. })
    }
}
