//! Artifact identifiers.

use std::path::PathBuf;

/// Document format of an artifact, which also fixes its file extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactFormat {
    /// Pretty-printed JSON document
    Json,
    /// Markdown prose
    Markdown,
    /// Plain text
    Text,
}

impl ArtifactFormat {
    /// File extension used on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Json => "json",
            ArtifactFormat::Markdown => "md",
            ArtifactFormat::Text => "txt",
        }
    }
}

/// Stable identifier of one artifact.
///
/// `namespace` is a `/`-separated directory path relative to the store root;
/// `name` is the file stem. Keys render as their relative path:
///
/// ```
/// use mangaweave_storage::ArtifactKey;
///
/// let key = ArtifactKey::json("timelines/timeline_ch_003_a1_b01", "ch_004.summary");
/// assert_eq!(key.to_string(), "timelines/timeline_ch_003_a1_b01/ch_004.summary.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    namespace: String,
    name: String,
    format: ArtifactFormat,
}

impl ArtifactKey {
    /// Key for an artifact of the given format.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        format: ArtifactFormat,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            format,
        }
    }

    /// Key for a JSON artifact.
    pub fn json(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, ArtifactFormat::Json)
    }

    /// Key for a markdown artifact.
    pub fn markdown(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, ArtifactFormat::Markdown)
    }

    /// Key for a plain-text artifact.
    pub fn text(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, ArtifactFormat::Text)
    }

    /// Directory path relative to the store root.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// File stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document format.
    pub fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// Sibling key in the same namespace and format with a new name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), name, self.format)
    }

    /// Quarantine key for a degraded version of this artifact.
    ///
    /// ```
    /// use mangaweave_storage::ArtifactKey;
    ///
    /// let key = ArtifactKey::json("scales", "ch_002.scales");
    /// assert_eq!(key.degraded().to_string(), "scales/ch_002.scales.degraded.json");
    /// ```
    pub fn degraded(&self) -> Self {
        self.with_name(format!("{}.degraded", self.name))
    }

    /// File name on disk.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.format.extension())
    }

    /// Relative path of the artifact; `None` when a segment would escape the root.
    pub(crate) fn relative_path(&self) -> Option<PathBuf> {
        let valid_segment = |s: &str| !s.is_empty() && s != "." && s != ".." && !s.contains('\\');
        if !valid_segment(&self.name) || self.name.contains('/') {
            return None;
        }
        let mut path = PathBuf::new();
        if !self.namespace.is_empty() {
            for segment in self.namespace.split('/') {
                if !valid_segment(segment) {
                    return None;
                }
                path.push(segment);
            }
        }
        path.push(self.file_name());
        Some(path)
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.file_name())
        } else {
            write!(f, "{}/{}", self.namespace, self.file_name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_rejects_escapes() {
        assert!(ArtifactKey::json("../outside", "x").relative_path().is_none());
        assert!(ArtifactKey::json("novel", "a/b").relative_path().is_none());
        assert!(ArtifactKey::json("novel", "").relative_path().is_none());
        assert!(ArtifactKey::json("a//b", "x").relative_path().is_none());
    }

    #[test]
    fn test_relative_path_nested_namespace() {
        let key = ArtifactKey::markdown("novel", "ch_001");
        assert_eq!(
            key.relative_path().unwrap(),
            PathBuf::from("novel").join("ch_001.md")
        );
    }

    #[test]
    fn test_format_parses_from_lowercase() {
        assert_eq!("markdown".parse::<ArtifactFormat>().unwrap(), ArtifactFormat::Markdown);
        assert_eq!(ArtifactFormat::Text.to_string(), "text");
    }
}
