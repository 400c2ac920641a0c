//! Stage names, parameters and reports.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// Pipeline stages, in the order `all` runs them where applicable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Split the page sequence into chapters
    Chapters,
    /// Describe each chapter from its page images
    #[strum(to_string = "describe", serialize = "vlm")]
    Describe,
    /// Correct chapter summaries with whole-story context
    Refine,
    /// Write prose chapters and their synopses
    Novel,
    /// Build the whole-story index
    StoryIndex,
    /// Extract plot anchors per chapter
    Anchors,
    /// Suggest what-if branches for pivotal anchors
    Branches,
    /// Simulate the next chapter of one branch timeline
    BranchGenerate,
    /// Build the character bible
    Characters,
    /// Rate chapter content
    Scales,
    /// Simulate the next chapter of the main line or a timeline
    Continue,
    /// Every stage of the main sequence
    All,
}

impl Stage {
    /// The sequence `all` runs.
    pub const ALL_ORDER: [Stage; 9] = [
        Stage::Chapters,
        Stage::Describe,
        Stage::Refine,
        Stage::Novel,
        Stage::Anchors,
        Stage::Branches,
        Stage::Characters,
        Stage::Scales,
        Stage::Continue,
    ];
}

/// Optional per-run parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageParams {
    /// Branch to extend; required by `branch_generate`
    pub branch_id: Option<String>,
    /// Summary namespace to continue instead of the main line
    pub timeline: Option<String>,
}

impl StageParams {
    /// Parameters naming a branch.
    pub fn with_branch(mut self, branch_id: impl Into<String>) -> Self {
        self.branch_id = Some(branch_id.into());
        self
    }

    /// Parameters naming a timeline namespace.
    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }
}

/// A unit that could not be produced this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    /// Unit identifier, e.g. a chapter or anchor id
    pub unit: String,
    /// What went wrong
    pub reason: String,
}

/// Outcome of one stage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Stage that ran
    pub stage: Stage,
    /// Units whose artifact already existed
    pub skipped: usize,
    /// Units produced and written this run
    pub succeeded: usize,
    /// Units that exhausted their generation budget
    pub degraded: Vec<UnitFailure>,
}

impl StageReport {
    /// Empty report for `stage`.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            skipped: 0,
            succeeded: 0,
            degraded: Vec::new(),
        }
    }

    /// True when no unit degraded.
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty()
    }

    pub(crate) fn skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn succeed(&mut self) {
        self.succeeded += 1;
    }

    pub(crate) fn fail(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.degraded.push(UnitFailure {
            unit: unit.into(),
            reason: reason.into(),
        });
    }
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} skipped, {} degraded",
            self.stage,
            self.succeeded,
            self.skipped,
            self.degraded.len()
        )
    }
}
