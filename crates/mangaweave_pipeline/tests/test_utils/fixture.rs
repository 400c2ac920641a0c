//! Temporary pipeline workspace.

use super::RoutingDriver;
use mangaweave_pipeline::{Pipeline, PipelineConfig};
use mangaweave_storage::{ArtifactKey, ArtifactStore, FileSystemArtifactStore};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Pages and artifacts under one temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub config: PipelineConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::default();
        config.paths.pages_dir = dir.path().join("pages");
        config.paths.artifacts_dir = dir.path().join("artifacts");
        config.models.system_prompt = String::new();
        std::fs::create_dir_all(&config.paths.pages_dir).unwrap();
        Self { dir, config }
    }

    pub fn pages_dir(&self) -> &Path {
        &self.config.paths.pages_dir
    }

    pub fn artifact_path(&self, relative: &str) -> PathBuf {
        self.config.paths.artifacts_dir.join(relative)
    }

    pub fn store(&self) -> FileSystemArtifactStore {
        FileSystemArtifactStore::new(&self.config.paths.artifacts_dir).unwrap()
    }

    pub fn pipeline(&self, driver: &RoutingDriver) -> Pipeline<RoutingDriver, FileSystemArtifactStore> {
        Pipeline::new(self.config.clone(), driver.clone(), self.store())
    }

    /// Write placeholder page files and a chapter index over them.
    pub async fn seed_chapters(&self, pages_per_chapter: &[usize]) {
        let mut chapters = Vec::new();
        let mut start = 0;
        for (k, count) in pages_per_chapter.iter().enumerate() {
            let pages: Vec<String> = (start..start + count)
                .map(|i| {
                    let path = self.pages_dir().join(format!("{:03}.png", i));
                    std::fs::write(&path, b"page").unwrap();
                    path.display().to_string()
                })
                .collect();
            chapters.push(json!({
                "chapter_id": format!("ch_{:03}", k + 1),
                "start_idx": start,
                "end_idx": start + count - 1,
                "pages": pages,
            }));
            start += count;
        }
        self.write_json("chapters", "chapters_index", json!({ "chapters": chapters }))
            .await;
    }

    pub async fn write_json(&self, namespace: &str, name: &str, value: Value) {
        self.store()
            .write_json(&ArtifactKey::json(namespace, name), &value)
            .await
            .unwrap();
    }

    pub async fn write_markdown(&self, namespace: &str, name: &str, text: &str) {
        self.store()
            .write_text(&ArtifactKey::markdown(namespace, name), text)
            .await
            .unwrap();
    }

    pub async fn read_json(&self, namespace: &str, name: &str) -> Value {
        self.store()
            .read_json(&ArtifactKey::json(namespace, name))
            .await
            .unwrap()
    }

    pub async fn exists_json(&self, namespace: &str, name: &str) -> bool {
        self.store()
            .exists(&ArtifactKey::json(namespace, name))
            .await
            .unwrap()
    }
}

/// Write a chapter summary with the given events into `namespace`.
pub async fn seed_summary(fixture: &Fixture, namespace: &str, chapter_id: &str, events: &[&str]) {
    fixture
        .write_json(
            namespace,
            &format!("{}.summary", chapter_id),
            json!({
                "chapter_id": chapter_id,
                "events": events,
                "dialogues": [],
            }),
        )
        .await;
}
