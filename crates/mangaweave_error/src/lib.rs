//! Error types for mangaweave.
//!
//! Every error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - constructors use `#[track_caller]` for automatic location capture
//!
//! Domain errors convert into [`MangaweaveError`] with `?`.
//!
//! ```
//! use mangaweave_error::{MangaweaveResult, StorageError, StorageErrorKind};
//!
//! fn load() -> MangaweaveResult<String> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("novel/ch_001.md".into())))?
//! }
//!
//! assert!(load().unwrap_err().is_not_found());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod json;
mod models;
mod pipeline;
mod storage;
mod validation;

pub use config::ConfigError;
pub use error::{MangaweaveError, MangaweaveErrorKind, MangaweaveResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use json::JsonError;
pub use models::{ModelsError, ModelsErrorKind};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{FieldViolation, ValidationError, ValidationErrorKind};
