//! Write-once artifact storage for mangaweave.
//!
//! Every stage output is an artifact: a JSON or text document under a stable
//! [`ArtifactKey`]. Stages check [`ArtifactStore::exists`] before producing a
//! unit and skip it when the artifact is already there, which is what makes a
//! pipeline run resumable. There is deliberately no update API.
//!
//! # Example
//!
//! ```rust
//! use mangaweave_storage::{ArtifactKey, ArtifactStore, FileSystemArtifactStore};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileSystemArtifactStore::new("/tmp/mangaweave-artifacts")?;
//! let key = ArtifactKey::json("summaries", "ch_001.summary");
//!
//! if !store.exists(&key).await? {
//!     store.write_json(&key, &json!({"chapter_id": "ch_001"})).await?;
//! }
//! let summary = store.read_json(&key).await?;
//! assert_eq!(summary["chapter_id"], "ch_001");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use mangaweave_error::MangaweaveResult;

mod filesystem;
mod key;

pub use filesystem::FileSystemArtifactStore;
pub use key::{ArtifactFormat, ArtifactKey};
pub use mangaweave_error::{StorageError, StorageErrorKind};

/// Trait for artifact storage backends.
///
/// Writes must be atomic: a concurrent reader sees either no artifact or the
/// complete document, never a partial one.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Whether an artifact exists under `key`.
    async fn exists(&self, key: &ArtifactKey) -> MangaweaveResult<bool>;

    /// Read and parse a JSON artifact.
    ///
    /// # Errors
    ///
    /// `StorageErrorKind::NotFound` when absent, `Malformed` when not valid JSON.
    async fn read_json(&self, key: &ArtifactKey) -> MangaweaveResult<serde_json::Value>;

    /// Read a text or markdown artifact.
    async fn read_text(&self, key: &ArtifactKey) -> MangaweaveResult<String>;

    /// Write a JSON artifact (pretty-printed, UTF-8, non-ASCII kept literal).
    async fn write_json(&self, key: &ArtifactKey, value: &serde_json::Value)
    -> MangaweaveResult<()>;

    /// Write a text or markdown artifact.
    async fn write_text(&self, key: &ArtifactKey, text: &str) -> MangaweaveResult<()>;

    /// Keys of all artifacts of `format` directly inside `namespace`, sorted by name.
    ///
    /// A namespace that does not exist yet lists as empty.
    async fn list(
        &self,
        namespace: &str,
        format: ArtifactFormat,
    ) -> MangaweaveResult<Vec<ArtifactKey>>;
}
