//! Generation capability error types.

/// Kinds of generation errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The driver call itself failed
    #[display("Driver failed: {}", _0)]
    Driver(String),
    /// The driver call did not complete in time
    #[display("Generation timed out after {}s", _0)]
    Timeout(u64),
    /// The driver returned no text output
    #[display("Empty response from {}", _0)]
    EmptyResponse(String),
    /// Every attempt of a free-text generation failed
    #[display("Generation failed after {} attempt(s): {}", attempts, last_error)]
    Exhausted {
        /// Attempts spent
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },
}

/// Generation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new generation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
