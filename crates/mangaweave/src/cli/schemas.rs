//! Shape descriptor export.

use mangaweave::{
    JsonError, MangaweaveResult, PipelineConfig, ShapeRegistry, StorageError, StorageErrorKind,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write `{name}.schema.json` for every registered shape into `out`.
///
/// # Errors
///
/// Configuration errors, or a `StorageError` when `out` cannot be written.
pub async fn write_schemas(out: &Path, config_path: Option<&Path>) -> MangaweaveResult<()> {
    let config = PipelineConfig::load(config_path)?;
    let registry = ShapeRegistry::builtin(&config.scales);
    let written = export(&registry, out).await?;
    info!(count = written.len(), out = %out.display(), "Wrote shape descriptors");
    Ok(())
}

async fn export(registry: &ShapeRegistry, out: &Path) -> MangaweaveResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out).await.map_err(|e| {
        StorageError::new(StorageErrorKind::DirectoryCreation(format!(
            "{}: {}",
            out.display(),
            e
        )))
    })?;

    let mut written = Vec::with_capacity(registry.len());
    for shape in registry.iter() {
        let path = out.join(format!("{}.schema.json", shape.name()));
        let mut text = serde_json::to_string_pretty(&shape.json_descriptor())
            .map_err(|e| JsonError::new(e.to_string()))?;
        text.push('\n');
        tokio::fs::write(&path, text).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("{}: {}", path.display(), e)))
        })?;
        debug!(path = %path.display(), "Wrote descriptor");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangaweave::{ScaleBounds, names};

    #[tokio::test]
    async fn test_export_writes_one_file_per_shape() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ShapeRegistry::builtin(&ScaleBounds::default());

        let written = export(&registry, &dir.path().join("schemas")).await.unwrap();
        assert_eq!(written.len(), registry.len());

        let path = dir
            .path()
            .join("schemas")
            .join(format!("{}.schema.json", names::CHAPTER_SUMMARY));
        let descriptor: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(descriptor["title"], names::CHAPTER_SUMMARY);
        assert_eq!(descriptor["type"], "object");
        assert!(
            descriptor["required"]
                .as_array()
                .unwrap()
                .iter()
                .any(|f| f == "chapter_id")
        );
    }
}
