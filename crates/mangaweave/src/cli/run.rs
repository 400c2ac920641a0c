//! Stage execution command handler.

use mangaweave::{
    FileSystemArtifactStore, MangaweaveResult, Pipeline, PipelineConfig, StageParams, XaiClient,
};
use std::path::Path;
use tracing::{info, instrument, warn};

/// Run `stage` with the layered configuration.
///
/// Each report is logged; degraded units are listed individually.
///
/// # Errors
///
/// Configuration, client or stage errors, including an unknown stage name.
#[instrument(skip_all, fields(stage = %stage))]
pub async fn run_stage(
    stage: &str,
    branch_id: Option<String>,
    timeline: Option<String>,
    config_path: Option<&Path>,
) -> MangaweaveResult<()> {
    let config = PipelineConfig::load(config_path)?;

    let models = &config.models;
    let client = XaiClient::from_env(&models.api_key_env, &models.api_base, &models.text_model)?
        .with_requests_per_minute(models.requests_per_minute);
    let store = FileSystemArtifactStore::new(&config.paths.artifacts_dir)?;

    info!(
        pages = %config.paths.pages_dir.display(),
        artifacts = %config.paths.artifacts_dir.display(),
        text_model = %models.text_model,
        vision_model = %models.vision_model,
        "Starting pipeline"
    );

    let params = StageParams {
        branch_id,
        timeline,
    };
    let pipeline = Pipeline::new(config, client, store);

    for report in pipeline.run_named(stage, &params).await? {
        info!(
            stage = %report.stage,
            skipped = report.skipped,
            succeeded = report.succeeded,
            degraded = report.degraded.len(),
            "{}",
            report
        );
        for failure in &report.degraded {
            warn!(unit = %failure.unit, reason = %failure.reason, "Unit degraded");
        }
    }

    Ok(())
}
