//! mangaweave - manga to narrative pipeline
//!
//! mangaweave reads an ordered sequence of manga page images and, stage by
//! stage, turns it into structured chapter summaries, a prose novel, a story
//! index, plot anchors, what-if branches with simulated chapters, a character
//! bible and per-chapter content ratings. Every stage output is a checkpointed
//! artifact, so an interrupted run resumes where it stopped.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mangaweave::{FileSystemArtifactStore, Pipeline, PipelineConfig, Stage, StageParams, XaiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load(None)?;
//! let client = XaiClient::from_env(
//!     &config.models.api_key_env,
//!     &config.models.api_base,
//!     &config.models.text_model,
//! )?;
//! let store = FileSystemArtifactStore::new(&config.paths.artifacts_dir)?;
//!
//! let pipeline = Pipeline::new(config, client, store);
//! for report in pipeline.run(Stage::All, &StageParams::default()).await? {
//!     println!("{}", report);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `mangaweave_error` - Error types
//! - `mangaweave_core` - Request, message and media types, tracing setup
//! - `mangaweave_interface` - `MangaweaveDriver` trait
//! - `mangaweave_schema` - Shape registry and validator for model output
//! - `mangaweave_storage` - Write-once artifact store
//! - `mangaweave_generation` - JSON extraction and the bounded retry loop
//! - `mangaweave_pipeline` - Stages, configuration and chapter segmentation
//! - `mangaweave_models` - xAI chat completions client
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use mangaweave_core::*;
pub use mangaweave_error::*;
pub use mangaweave_generation::*;
pub use mangaweave_interface::*;
pub use mangaweave_models::*;
pub use mangaweave_pipeline::*;
pub use mangaweave_schema::*;
pub use mangaweave_storage::*;
