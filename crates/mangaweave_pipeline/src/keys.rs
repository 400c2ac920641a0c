//! Artifact keys and identifier conventions.

use mangaweave_storage::{ArtifactFormat, ArtifactKey};
use regex::Regex;
use std::sync::LazyLock;

static CHAPTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ch_(\d+)").expect("Valid chapter regex"));

static CHAPTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(ch_\d+)").expect("Valid chapter prefix regex"));

pub(crate) const CHAPTERS: &str = "chapters";
pub(crate) const SUMMARIES: &str = "summaries";
pub(crate) const NOVEL: &str = "novel";
pub(crate) const STORY_INDEX: &str = "story_index";
pub(crate) const TIMELINE: &str = "timeline";
pub(crate) const BRANCH_SUGGESTIONS: &str = "timeline/branch_suggestions";
pub(crate) const CHARACTERS: &str = "characters";
pub(crate) const SCALES: &str = "scales";

/// Chapter id for a 1-based chapter number.
///
/// ```
/// use mangaweave_pipeline::chapter_id;
///
/// assert_eq!(chapter_id(7), "ch_007");
/// assert_eq!(chapter_id(1234), "ch_1234");
/// ```
pub fn chapter_id(number: u32) -> String {
    format!("ch_{:03}", number)
}

/// Number of the first `ch_NNN` occurrence in `s`.
pub fn chapter_number(s: &str) -> Option<u32> {
    CHAPTER_NUMBER
        .captures(s)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The `ch_NNN` prefix a branch id starts with, if any.
pub(crate) fn origin_chapter(branch_id: &str) -> Option<String> {
    CHAPTER_PREFIX
        .captures(branch_id)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Replace characters that cannot appear in an artifact name.
pub(crate) fn key_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "unknown".to_string(),
        s => s.to_string(),
    }
}

pub(crate) fn chapter_index() -> ArtifactKey {
    ArtifactKey::json(CHAPTERS, "chapters_index")
}

pub(crate) fn summary_in(namespace: &str, chapter: &str) -> ArtifactKey {
    ArtifactKey::json(namespace, format!("{}.summary", chapter))
}

pub(crate) fn summary(chapter: &str) -> ArtifactKey {
    summary_in(SUMMARIES, chapter)
}

pub(crate) fn refined_summary(chapter: &str) -> ArtifactKey {
    ArtifactKey::json(SUMMARIES, format!("{}.summary.refined", chapter))
}

pub(crate) fn novel_chapter(chapter: &str) -> ArtifactKey {
    ArtifactKey::markdown(NOVEL, chapter)
}

pub(crate) fn synopsis(chapter: &str) -> ArtifactKey {
    ArtifactKey::text(NOVEL, format!("{}.synopsis", chapter))
}

pub(crate) fn full_novel() -> ArtifactKey {
    ArtifactKey::markdown(NOVEL, "full_novel")
}

pub(crate) fn story_index() -> ArtifactKey {
    ArtifactKey::json(STORY_INDEX, "story_index")
}

pub(crate) fn chapter_anchors(chapter: &str) -> ArtifactKey {
    ArtifactKey::json(TIMELINE, format!("{}.anchors", chapter))
}

pub(crate) fn anchors() -> ArtifactKey {
    ArtifactKey::json(TIMELINE, "anchors")
}

pub(crate) fn anchor_branches(anchor_id: &str) -> ArtifactKey {
    ArtifactKey::json(BRANCH_SUGGESTIONS, key_segment(anchor_id))
}

pub(crate) fn branches() -> ArtifactKey {
    ArtifactKey::json(TIMELINE, "branches")
}

pub(crate) fn timeline_namespace(branch_id: &str) -> String {
    format!("timelines/timeline_{}", key_segment(branch_id))
}

pub(crate) fn branch_config(branch_id: &str) -> ArtifactKey {
    ArtifactKey::json(
        timeline_namespace(branch_id),
        format!("{}.config", key_segment(branch_id)),
    )
}

pub(crate) fn characters() -> ArtifactKey {
    ArtifactKey::json(CHARACTERS, "characters")
}

pub(crate) fn character(character_id: &str) -> ArtifactKey {
    ArtifactKey::json(CHARACTERS, key_segment(character_id))
}

pub(crate) fn chapter_scales(chapter: &str) -> ArtifactKey {
    ArtifactKey::json(SCALES, format!("{}.scales", chapter))
}

pub(crate) fn scales_by_chapter() -> ArtifactKey {
    ArtifactKey::json(SCALES, "scales_by_chapter")
}

/// Chapter ids of the plain summaries in `keys`, in key order.
///
/// Refined and quarantined summaries are excluded.
pub(crate) fn summary_chapters(keys: &[ArtifactKey]) -> Vec<String> {
    keys.iter()
        .filter_map(|k| k.name().strip_suffix(".summary"))
        .filter(|id| is_chapter_id(id))
        .map(str::to_string)
        .collect()
}

/// Chapter ids of the prose chapters in `keys`, in key order.
pub(crate) fn novel_chapters(keys: &[ArtifactKey]) -> Vec<String> {
    keys.iter()
        .filter(|k| k.format() == ArtifactFormat::Markdown)
        .map(|k| k.name())
        .filter(|name| is_chapter_id(name))
        .map(str::to_string)
        .collect()
}

fn is_chapter_id(s: &str) -> bool {
    s.strip_prefix("ch_")
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_number_parsing() {
        assert_eq!(chapter_number("ch_012.summary"), Some(12));
        assert_eq!(chapter_number("timeline_ch_005_a001_b02"), Some(5));
        assert_eq!(chapter_number("prologue"), None);
    }

    #[test]
    fn test_origin_requires_prefix() {
        assert_eq!(origin_chapter("ch_005_a001_b02").as_deref(), Some("ch_005"));
        assert_eq!(origin_chapter("x_ch_005"), None);
    }

    #[test]
    fn test_key_segment_sanitizes() {
        assert_eq!(key_segment("ch_001_a002"), "ch_001_a002");
        assert_eq!(key_segment("../evil/id"), "_evil_id");
        assert_eq!(key_segment("  "), "unknown");
        assert_eq!(key_segment("Kōta Ōno"), "Kōta_Ōno");
    }

    #[test]
    fn test_summary_chapters_skip_refined_and_degraded() {
        let keys = vec![
            summary("ch_001"),
            refined_summary("ch_001"),
            summary("ch_002").degraded(),
            summary("ch_003"),
        ];
        assert_eq!(summary_chapters(&keys), vec!["ch_001", "ch_003"]);
    }

    #[test]
    fn test_novel_chapters_skip_aggregate() {
        let keys = vec![
            novel_chapter("ch_001"),
            full_novel(),
            novel_chapter("ch_002").degraded(),
        ];
        assert_eq!(novel_chapters(&keys), vec!["ch_001"]);
    }
}
