//! Top-level error wrapper types.

use crate::{
    ConfigError, GenerationError, JsonError, ModelsError, PipelineError, StorageError,
    ValidationError,
};

/// Every error a mangaweave crate can produce.
///
/// # Examples
///
/// ```
/// use mangaweave_error::{MangaweaveError, ModelsError, ModelsErrorKind};
///
/// let models_err = ModelsError::new(ModelsErrorKind::Transport("Connection failed".into()));
/// let err: MangaweaveError = models_err.into();
/// assert!(format!("{}", err).contains("Request failed: Connection failed"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MangaweaveErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Artifact storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Shape validation error
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Generation capability error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Stage precondition or parameter error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Model provider error
    #[from(ModelsError)]
    Models(ModelsError),
}

/// Mangaweave error with kind discrimination.
///
/// # Examples
///
/// ```
/// use mangaweave_error::{MangaweaveResult, ConfigError};
///
/// fn might_fail() -> MangaweaveResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Mangaweave Error: {}", _0)]
pub struct MangaweaveError(Box<MangaweaveErrorKind>);

impl MangaweaveError {
    /// Create a new error from a kind.
    pub fn new(kind: MangaweaveErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MangaweaveErrorKind {
        &self.0
    }

    /// True when this is a missing-artifact storage error.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), MangaweaveErrorKind::Storage(e) if e.is_not_found())
    }
}

// Generic From implementation for any type that converts to MangaweaveErrorKind
impl<T> From<T> for MangaweaveError
where
    T: Into<MangaweaveErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for mangaweave operations.
pub type MangaweaveResult<T> = std::result::Result<T, MangaweaveError>;
