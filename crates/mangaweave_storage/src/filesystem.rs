//! Filesystem artifact store.
//!
//! Artifacts live at `{base_path}/{namespace}/{name}.{ext}`:
//!
//! ```text
//! artifacts/
//! ├── chapters/chapters_index.json
//! ├── summaries/
//! │   ├── ch_001.summary.json
//! │   └── ch_001.summary.refined.json
//! ├── novel/
//! │   ├── ch_001.md
//! │   └── full_novel.md
//! └── timeline/anchors.json
//! ```

use crate::{ArtifactFormat, ArtifactKey, ArtifactStore};
use mangaweave_error::{MangaweaveResult, StorageError, StorageErrorKind};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem storage backend.
///
/// Writes go to a uniquely named temp file in the target directory and are
/// renamed over the destination, so readers never observe a partial document.
#[derive(Debug, Clone)]
pub struct FileSystemArtifactStore {
    base_path: PathBuf,
}

impl FileSystemArtifactStore {
    /// Create a new filesystem store rooted at `base_path`.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> MangaweaveResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened artifact store");
        Ok(Self { base_path })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Absolute path of an artifact.
    pub fn path_for(&self, key: &ArtifactKey) -> MangaweaveResult<PathBuf> {
        let relative = key
            .relative_path()
            .ok_or_else(|| StorageError::new(StorageErrorKind::InvalidKey(key.to_string())))?;
        Ok(self.base_path.join(relative))
    }

    async fn read_bytes(&self, key: &ArtifactKey) -> MangaweaveResult<Vec<u8>> {
        let path = self.path_for(key)?;
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(key = %key, size = data.len(), "Read artifact");
        Ok(data)
    }

    async fn write_bytes(&self, key: &ArtifactKey, data: &[u8]) -> MangaweaveResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", key.file_name(), Uuid::new_v4()));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
            .into());
        }

        tracing::info!(key = %key, size = data.len(), "Wrote artifact");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn exists(&self, key: &ArtifactKey) -> MangaweaveResult<bool> {
        let path = self.path_for(key)?;
        let exists = tokio::fs::try_exists(&path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
        })?;
        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn read_json(&self, key: &ArtifactKey) -> MangaweaveResult<serde_json::Value> {
        let data = self.read_bytes(key).await?;
        let value = serde_json::from_slice(&data).map_err(|e| {
            StorageError::new(StorageErrorKind::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(value)
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn read_text(&self, key: &ArtifactKey) -> MangaweaveResult<String> {
        let data = self.read_bytes(key).await?;
        let text = String::from_utf8(data).map_err(|e| {
            StorageError::new(StorageErrorKind::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })?;
        Ok(text)
    }

    #[tracing::instrument(skip(self, value), fields(key = %key))]
    async fn write_json(
        &self,
        key: &ArtifactKey,
        value: &serde_json::Value,
    ) -> MangaweaveResult<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", key, e)))
        })?;
        self.write_bytes(key, text.as_bytes()).await
    }

    #[tracing::instrument(skip(self, text), fields(key = %key))]
    async fn write_text(&self, key: &ArtifactKey, text: &str) -> MangaweaveResult<()> {
        self.write_bytes(key, text.as_bytes()).await
    }

    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        namespace: &str,
        format: ArtifactFormat,
    ) -> MangaweaveResult<Vec<ArtifactKey>> {
        // Validate the namespace through a throwaway key.
        let probe = ArtifactKey::new(namespace, "probe", format);
        let dir = match self.path_for(&probe)?.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Ok(Vec::new()),
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
                .into());
            }
        };

        let suffix = format!(".{}", format.extension());
        let mut keys = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
            let Some(entry) = entry else { break };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            if let Some(stem) = file_name.strip_suffix(&suffix) {
                let is_file = entry
                    .file_type()
                    .await
                    .map(|t| t.is_file())
                    .unwrap_or(false);
                if is_file {
                    keys.push(ArtifactKey::new(namespace, stem, format));
                }
            }
        }

        keys.sort();
        tracing::debug!(namespace, count = keys.len(), "Listed artifacts");
        Ok(keys)
    }
}
