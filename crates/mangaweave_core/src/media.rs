//! Media source types for page images.

use serde::{Deserialize, Serialize};

/// Where media content is sourced from.
///
/// # Examples
///
/// ```
/// use mangaweave_core::MediaSource;
///
/// let url = MediaSource::Url("https://example.com/page.png".to_string());
/// let base64 = MediaSource::Base64("iVBORw0KGgo...".to_string());
/// let binary = MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaSource {
    /// URL to fetch the content from
    Url(String),
    /// Base64-encoded content
    Base64(String),
    /// Raw binary data
    Binary(Vec<u8>),
}

/// How much resolution a vision model should spend on an image.
///
/// Title-page checks use `Low`; page description uses `High`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    /// Cheap, downscaled view
    #[display("low")]
    Low,
    /// Full-resolution tiles
    #[display("high")]
    High,
    /// Let the provider decide
    #[default]
    #[display("auto")]
    Auto,
}
