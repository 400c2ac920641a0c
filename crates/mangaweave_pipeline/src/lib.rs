//! Resumable manga to narrative pipeline.
//!
//! A directory of page images is turned into a chain of artifacts, one stage
//! at a time:
//!
//! - **chapters**: split the page sequence at colour title pages confirmed by
//!   a vision model
//! - **describe**: per-chapter summaries from page image batches
//! - **refine**, **novel**, **story_index**: corrected summaries, prose with a
//!   rolling story context, and a whole-story index
//! - **anchors**, **branches**, **branch_generate**: pivotal plot moments,
//!   what-if suggestions and simulated branch timelines
//! - **characters**, **scales**, **continue**: character bible, content
//!   ratings and simulated continuation chapters
//!
//! Every unit is written once and skipped when it already exists, so an
//! interrupted run picks up where it stopped.
//!
//! # Example
//!
//! ```rust,ignore
//! use mangaweave_pipeline::{Pipeline, PipelineConfig, Stage, StageParams};
//! use mangaweave_storage::FileSystemArtifactStore;
//!
//! let config = PipelineConfig::load(None)?;
//! let store = FileSystemArtifactStore::new(&config.paths.artifacts_dir)?;
//! let pipeline = Pipeline::new(config, driver, store);
//! let reports = pipeline.run(Stage::All, &StageParams::default()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod keys;
mod pages;
mod pipeline;
mod prompts;
mod segmentation;
mod stage;
mod stages;

pub use config::{
    BatchConfig, BranchesConfig, ContextConfig, ContinuationConfig, GenerationConfig,
    ModelsConfig, NovelConfig, PathsConfig, PipelineConfig, SegmentationConfig, Temperatures,
};
pub use context::{RollingContext, TRUNCATION_MARKER, head_chars, tail_chars};
pub use keys::{chapter_id, chapter_number};
pub use pages::{colored_ratio, is_colored_page, load_all_pages, mime_for};
pub use pipeline::Pipeline;
pub use segmentation::{BoundaryDetector, TitleOracle, VisionTitleOracle, chapter_spans};
pub use stage::{Stage, StageParams, StageReport, UnitFailure};
pub use stages::{ChapterEntry, ChapterIndex};
