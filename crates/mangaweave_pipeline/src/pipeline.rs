//! The stage runner.

use crate::{PipelineConfig, Stage, StageParams, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError, PipelineErrorKind};
use mangaweave_generation::{Generated, GenerationLoop};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{Payload, Shape, ShapeRegistry, validate_value};
use mangaweave_storage::{ArtifactFormat, ArtifactKey, ArtifactStore};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Runs pipeline stages against an artifact store.
///
/// Every stage follows the same discipline: for each unit, skip it when its
/// artifact exists, otherwise generate and write it once. A unit whose
/// generation degraded is reported and quarantined under `{name}.degraded`
/// instead of its own key, so the next run retries it. Aggregates are
/// re-derived from the persisted units on every run.
///
/// # Example
///
/// ```no_run
/// use mangaweave_pipeline::{Pipeline, PipelineConfig, Stage, StageParams};
/// use mangaweave_storage::FileSystemArtifactStore;
/// # use mangaweave_interface::MangaweaveDriver;
///
/// # async fn example<D: MangaweaveDriver + Clone>(driver: D) -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::load(None)?;
/// let store = FileSystemArtifactStore::new(&config.paths.artifacts_dir)?;
/// let pipeline = Pipeline::new(config, driver, store);
///
/// for report in pipeline.run(Stage::Chapters, &StageParams::default()).await? {
///     println!("{}", report);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<D, S> {
    config: PipelineConfig,
    shapes: ShapeRegistry,
    text: GenerationLoop<D>,
    vision: GenerationLoop<D>,
    store: S,
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Build a pipeline. Text calls use `models.text_model`, calls carrying
    /// page images use `models.vision_model`.
    pub fn new(config: PipelineConfig, driver: D, store: S) -> Self {
        let generation = |model: &str| {
            GenerationLoop::new(driver.clone())
                .with_model(model)
                .with_timeout(config.models.request_timeout())
                .with_system_prompt(config.models.system_prompt.clone())
        };
        let text = generation(&config.models.text_model);
        let vision = generation(&config.models.vision_model);
        let shapes = ShapeRegistry::builtin(&config.scales);

        Self {
            config,
            shapes,
            text,
            vision,
            store,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registered shapes.
    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    /// The artifact store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a stage by name.
    ///
    /// # Errors
    ///
    /// `PipelineErrorKind::UnknownStage` for an unrecognised name, otherwise
    /// as [`run`](Self::run).
    pub async fn run_named(
        &self,
        name: &str,
        params: &StageParams,
    ) -> MangaweaveResult<Vec<StageReport>> {
        let stage = Stage::from_str(name)
            .map_err(|_| PipelineError::new(PipelineErrorKind::UnknownStage(name.to_string())))?;
        self.run(stage, params).await
    }

    /// Run one stage, or the whole main sequence for [`Stage::All`].
    ///
    /// # Errors
    ///
    /// A missing precondition aborts the stage with a `PipelineError`; for
    /// `all`, the sequence stops at the first failing stage.
    pub async fn run(&self, stage: Stage, params: &StageParams) -> MangaweaveResult<Vec<StageReport>> {
        match stage {
            Stage::All => self.run_all(params).await,
            single => Ok(vec![self.run_stage(single, params).await?]),
        }
    }

    /// Run chapters through continue in order, one report per stage.
    ///
    /// # Errors
    ///
    /// The first stage error; reports of earlier stages are logged.
    pub async fn run_all(&self, params: &StageParams) -> MangaweaveResult<Vec<StageReport>> {
        let mut reports = Vec::with_capacity(Stage::ALL_ORDER.len());
        for stage in Stage::ALL_ORDER {
            reports.push(self.run_stage(stage, params).await?);
        }
        Ok(reports)
    }

    #[instrument(skip(self, params), fields(stage = %stage))]
    async fn run_stage(&self, stage: Stage, params: &StageParams) -> MangaweaveResult<StageReport> {
        info!("Stage starting");
        let report = match stage {
            Stage::Chapters => self.segment_chapters().await?,
            Stage::Describe => self.describe_chapters().await?,
            Stage::Refine => self.refine_summaries().await?,
            Stage::Novel => self.novelize().await?,
            Stage::StoryIndex => self.build_story_index().await?,
            Stage::Anchors => self.extract_anchors().await?,
            Stage::Branches => self.suggest_branches().await?,
            Stage::BranchGenerate => {
                let branch_id = params.branch_id.as_deref().ok_or_else(|| {
                    PipelineError::new(PipelineErrorKind::MissingParameter {
                        stage: stage.to_string(),
                        param: "branch_id".to_string(),
                    })
                })?;
                self.generate_branch_chapter(branch_id).await?
            }
            Stage::Characters => self.build_character_bible().await?,
            Stage::Scales => self.rate_chapters().await?,
            Stage::Continue => self.continue_story(params.timeline.as_deref()).await?,
            Stage::All => {
                return Err(PipelineError::new(PipelineErrorKind::UnknownStage(
                    "all cannot run as a single stage".to_string(),
                ))
                .into());
            }
        };

        if report.is_clean() {
            info!(
                succeeded = report.succeeded,
                skipped = report.skipped,
                "Stage finished"
            );
        } else {
            warn!(
                succeeded = report.succeeded,
                skipped = report.skipped,
                degraded = report.degraded.len(),
                "Stage finished with degraded units"
            );
        }
        Ok(report)
    }

    // Shared helpers used by the stage implementations.

    pub(crate) fn text(&self) -> &GenerationLoop<D> {
        &self.text
    }

    pub(crate) fn vision(&self) -> &GenerationLoop<D> {
        &self.vision
    }

    pub(crate) fn shape(&self, name: &str) -> MangaweaveResult<Arc<Shape>> {
        self.shapes.require(name)
    }

    pub(crate) fn max_attempts(&self) -> u32 {
        self.config.generation.max_attempts
    }

    /// Fail with `MissingArtifact` unless `key` exists.
    pub(crate) async fn require(&self, key: &ArtifactKey, producer: Stage) -> MangaweaveResult<()> {
        if self.store.exists(key).await? {
            Ok(())
        } else {
            Err(PipelineError::missing(key.to_string(), producer.to_string()).into())
        }
    }

    /// Read a JSON artifact and check it against `shape`; `None` when it
    /// is missing or no longer conforms.
    pub(crate) async fn load_payload(
        &self,
        key: &ArtifactKey,
        shape: &Shape,
    ) -> MangaweaveResult<Option<Payload>> {
        if !self.store.exists(key).await? {
            return Ok(None);
        }
        let value = self.store.read_json(key).await?;
        match validate_value(&value, shape) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored artifact does not conform; ignoring");
                Ok(None)
            }
        }
    }

    /// Keys in `namespace` of `format`, sorted.
    pub(crate) async fn list(
        &self,
        namespace: &str,
        format: ArtifactFormat,
    ) -> MangaweaveResult<Vec<ArtifactKey>> {
        self.store.list(namespace, format).await
    }

    /// Write a finished unit, or quarantine it when degraded.
    ///
    /// Returns whether the unit was written under its own key.
    pub(crate) async fn persist_json(
        &self,
        report: &mut StageReport,
        unit: &str,
        key: &ArtifactKey,
        value: &Value,
        health: UnitHealth,
    ) -> MangaweaveResult<bool> {
        match health.into_reason() {
            None => {
                self.store.write_json(key, value).await?;
                debug!(unit, key = %key, "Unit written");
                report.succeed();
                Ok(true)
            }
            Some(reason) => {
                let quarantine = key.degraded();
                self.store.write_json(&quarantine, value).await?;
                warn!(unit, key = %quarantine, reason = %reason, "Unit degraded; quarantined");
                report.fail(unit, reason);
                Ok(false)
            }
        }
    }
}

/// Collects what went wrong while producing one unit.
#[derive(Debug, Default)]
pub(crate) struct UnitHealth {
    problems: Vec<String>,
}

impl UnitHealth {
    /// Keep the payload of a structured call, noting degradation.
    pub(crate) fn take(&mut self, call: &str, generated: Generated) -> Payload {
        if let Generated::Degraded {
            attempts, errors, ..
        } = &generated
        {
            self.problems.push(format!(
                "{} degraded after {} attempt(s): {}",
                call,
                attempts,
                errors.last().map(String::as_str).unwrap_or("no response")
            ));
        }
        generated.into_payload()
    }

    /// Keep the text of a free-text call; failures yield `None`.
    pub(crate) fn text(&mut self, call: &str, result: MangaweaveResult<String>) -> Option<String> {
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                self.problems.push(format!("{} failed: {}", call, e));
                None
            }
        }
    }

    /// Record a failure that is not a generation outcome.
    pub(crate) fn note(&mut self, problem: impl Into<String>) {
        self.problems.push(problem.into());
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }

    pub(crate) fn into_reason(self) -> Option<String> {
        (!self.problems.is_empty()).then(|| self.problems.join("; "))
    }
}

/// String items of a list field.
pub(crate) fn strings(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
