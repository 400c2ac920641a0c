//! Name-indexed shape registry.

use crate::{Shape, builtin};
use mangaweave_error::{ConfigError, MangaweaveResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shapes by name, built once when the pipeline starts.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: BTreeMap<String, Arc<Shape>>,
}

impl ShapeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in shape; content scales use `bounds`.
    pub fn builtin(bounds: &builtin::ScaleBounds) -> Self {
        let mut registry = Self::new();
        for shape in [
            builtin::visual_details(),
            builtin::page_summary(),
            builtin::chapter_summary(),
            builtin::page_batch(),
            builtin::anchor(),
            builtin::anchor_list(),
            builtin::branch_option(),
            builtin::branch_draft(),
            builtin::branch_list(),
            builtin::branch_suggestions(),
            builtin::branch_config(),
            builtin::character(),
            builtin::character_bible(),
            builtin::chapter_scales(bounds),
            builtin::chapter_index_entry(),
            builtin::story_index(),
            builtin::chapter_act(),
            builtin::chapter_plan(),
            builtin::mainline_plan(),
            builtin::branch_plan(),
        ] {
            registry.register(shape);
        }
        registry
    }

    /// Add or replace a shape under its own name.
    pub fn register(&mut self, shape: Shape) {
        self.shapes.insert(shape.name().clone(), Arc::new(shape));
    }

    /// Look a shape up.
    pub fn get(&self, name: &str) -> Option<Arc<Shape>> {
        self.shapes.get(name).cloned()
    }

    /// Look a shape up, failing when it was never registered.
    pub fn require(&self, name: &str) -> MangaweaveResult<Arc<Shape>> {
        self.get(name)
            .ok_or_else(|| ConfigError::new(format!("Unknown shape: {}", name)).into())
    }

    /// Registered shapes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Shape>> {
        self.shapes.values()
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
