//! Pipeline stage error types.

/// Kinds of stage-level errors. Each of these aborts the stage it occurs in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// An upstream artifact the stage depends on has not been produced
    #[display("Missing upstream artifact {} (run stage '{}' first)", key, producer)]
    MissingArtifact {
        /// Key of the missing artifact
        key: String,
        /// Stage that produces it
        producer: String,
    },
    /// No page images were found
    #[display("No page images found in {}", _0)]
    NoPages(String),
    /// Stage name not recognised
    #[display("Unknown stage: {}", _0)]
    UnknownStage(String),
    /// A required stage parameter was not supplied
    #[display("Stage '{}' requires parameter '{}'", stage, param)]
    MissingParameter {
        /// Stage name
        stage: String,
        /// Parameter name
        param: String,
    },
    /// Branch id not present in the branch suggestions
    #[display("Branch not found: {}", _0)]
    BranchNotFound(String),
    /// Chapter identifier does not follow the `ch_NNN` convention
    #[display("Invalid chapter id: {}", _0)]
    InvalidChapterId(String),
    /// Page image could not be read or decoded
    #[display("Image error: {}", _0)]
    Image(String),
}

/// Pipeline error with location tracking.
///
/// # Examples
///
/// ```
/// use mangaweave_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::UnknownStage("paint".to_string()));
/// assert!(err.to_string().contains("Unknown stage: paint"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new pipeline error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a missing upstream artifact.
    #[track_caller]
    pub fn missing(key: impl Into<String>, producer: impl Into<String>) -> Self {
        Self::new(PipelineErrorKind::MissingArtifact {
            key: key.into(),
            producer: producer.into(),
        })
    }
}
