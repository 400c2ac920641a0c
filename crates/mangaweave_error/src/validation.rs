//! Shape validation error types.

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{}: {}", path, message)]
pub struct FieldViolation {
    /// Dotted path to the field, with list indices (`anchors[2].importance_score`)
    pub path: String,
    /// What was wrong with it
    pub message: String,
}

impl FieldViolation {
    /// Create a violation for the field at `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Kinds of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Candidate text is not a JSON object
    #[display("Not a JSON object: {}", _0)]
    Parse(String),
    /// Candidate parsed but does not conform to the shape
    #[display("{} violation(s) of shape '{}'", violations.len(), shape)]
    Shape {
        /// Shape name
        shape: String,
        /// Every violation found, in field order
        violations: Vec<FieldViolation>,
    },
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use mangaweave_error::{FieldViolation, ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::Shape {
///     shape: "anchor".to_string(),
///     violations: vec![FieldViolation::new("anchor_id", "field required")],
/// });
/// assert_eq!(err.listing(), "- anchor_id: field required");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The kind of error that occurred
    pub kind: ValidationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new validation error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Violations carried by a shape error; empty for parse errors.
    pub fn violations(&self) -> &[FieldViolation] {
        match &self.kind {
            ValidationErrorKind::Shape { violations, .. } => violations,
            ValidationErrorKind::Parse(_) => &[],
        }
    }

    /// One line per problem, suitable for feeding back into a prompt.
    pub fn listing(&self) -> String {
        match &self.kind {
            ValidationErrorKind::Parse(msg) => format!("- invalid JSON: {}", msg),
            ValidationErrorKind::Shape { violations, .. } => violations
                .iter()
                .map(|v| format!("- {}", v))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}
