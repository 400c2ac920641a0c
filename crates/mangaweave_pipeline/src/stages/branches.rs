//! Branch suggestions and branch timeline chapters.

use crate::context::tail_chars;
use crate::keys;
use crate::pipeline::UnitHealth;
use crate::prompts;
use crate::{Pipeline, Stage, StageReport};
use mangaweave_error::{MangaweaveResult, PipelineError, PipelineErrorKind};
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{names, validate_value};
use mangaweave_storage::ArtifactStore;
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

const DEFAULT_ORIGIN: &str = "ch_001";

/// Id of the `idx`-th (0-based) branch suggested for an anchor.
fn suggested_branch_id(anchor_id: &str, idx: usize) -> String {
    format!("{}_b{:02}", anchor_id, idx + 1)
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Suggest what-if branches for every anchor with enough branching potential.
    #[instrument(skip(self))]
    pub(crate) async fn suggest_branches(&self) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::Branches);
        let anchors_key = keys::anchors();
        self.require(&anchors_key, Stage::Anchors).await?;

        let anchor_list = self.shape(names::ANCHOR_LIST)?;
        let anchors = self
            .load_payload(&anchors_key, &anchor_list)
            .await?
            .map(|p| p.list("anchors").to_vec())
            .unwrap_or_default();

        let config = self.config();
        let story_context = match self.store().exists(&keys::full_novel()).await? {
            true => {
                let novel = self.store().read_text(&keys::full_novel()).await?;
                tail_chars(&novel, config.context.story_context_chars).to_string()
            }
            false => String::new(),
        };
        let character_context = match self.store().exists(&keys::characters()).await? {
            true => {
                let bible = self.store().read_json(&keys::characters()).await?;
                serde_json::to_string_pretty(&bible).unwrap_or_default()
            }
            false => String::new(),
        };

        let list_shape = self.shape(names::BRANCH_LIST)?;
        let option_shape = self.shape(names::BRANCH_OPTION)?;
        let min_potential = config.branches.min_branching_potential;

        let pivotal: Vec<&Value> = anchors
            .iter()
            .filter(|a| a.get("branching_potential").and_then(Value::as_i64).unwrap_or(0) >= min_potential)
            .collect();
        info!(anchors = anchors.len(), pivotal = pivotal.len(), "Suggesting branches");

        for anchor in &pivotal {
            let anchor_id = anchor.get("anchor_id").and_then(Value::as_str).unwrap_or_default();
            let key = keys::anchor_branches(anchor_id);
            if self.store().exists(&key).await? {
                info!(anchor = anchor_id, "Branch suggestions exist; skipping");
                report.skip();
                continue;
            }

            info!(anchor = anchor_id, "Generating branch suggestions");
            let prompt = prompts::branches(anchor, &story_context, &character_context);
            let mut health = UnitHealth::default();
            let drafts = health.take(
                "branch suggestions",
                self.text()
                    .generate_validated(
                        &prompt,
                        &list_shape,
                        self.max_attempts(),
                        config.generation.temperatures.branches,
                    )
                    .await,
            );

            let mut options = Vec::new();
            for (idx, draft) in drafts.list("branches").iter().enumerate() {
                let mut option = draft.as_object().cloned().unwrap_or_default();
                option.insert(
                    "branch_id".to_string(),
                    Value::String(suggested_branch_id(anchor_id, idx)),
                );
                option.insert("anchor_id".to_string(), Value::String(anchor_id.to_string()));
                match validate_value(&Value::Object(option), &option_shape) {
                    Ok(valid) => options.push(valid.into_value()),
                    Err(e) => warn!(anchor = anchor_id, error = %e, "Dropping invalid branch"),
                }
            }

            let document = json!({ "anchor_id": anchor_id, "branches": options });
            self.persist_json(&mut report, anchor_id, &key, &document, health)
                .await?;
        }

        let mut by_anchor = Map::new();
        for anchor in &pivotal {
            let anchor_id = anchor.get("anchor_id").and_then(Value::as_str).unwrap_or_default();
            let key = keys::anchor_branches(anchor_id);
            if self.store().exists(&key).await? {
                let stored = self.store().read_json(&key).await?;
                let branches = stored.get("branches").cloned().unwrap_or_else(|| json!([]));
                by_anchor.insert(anchor_id.to_string(), branches);
            }
        }
        let key = keys::branches();
        info!(key = %key, anchors = by_anchor.len(), "Writing branch aggregate");
        self.store()
            .write_json(&key, &json!({ "branches_by_anchor": by_anchor }))
            .await?;

        Ok(report)
    }

    /// Simulate the next chapter of one branch timeline.
    #[instrument(skip(self))]
    pub(crate) async fn generate_branch_chapter(
        &self,
        branch_id: &str,
    ) -> MangaweaveResult<StageReport> {
        let mut report = StageReport::new(Stage::BranchGenerate);
        let branches_key = keys::branches();
        self.require(&branches_key, Stage::Branches).await?;

        let suggestions = self
            .load_payload(&branches_key, &*self.shape(names::BRANCH_SUGGESTIONS)?)
            .await?
            .ok_or_else(|| PipelineError::missing(branches_key.to_string(), Stage::Branches.to_string()))?;
        let branch = suggestions
            .get("branches_by_anchor")
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|m| m.values())
            .filter_map(Value::as_array)
            .flatten()
            .find(|b| b.get("branch_id").and_then(Value::as_str) == Some(branch_id))
            .cloned()
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::BranchNotFound(branch_id.to_string())))?;

        let origin = keys::origin_chapter(branch_id).unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let namespace = keys::timeline_namespace(branch_id);
        info!(branch = branch_id, origin = %origin, "Extending branch timeline");

        let main = self.load_summaries(keys::SUMMARIES, false).await?;
        let branch_chapters = self.load_summaries(&namespace, false).await?;

        let mut sections = Vec::new();
        let mut found_origin = false;
        for summary in &main {
            sections.push(format!("CHAPTER {}: {}", summary.chapter_id, summary.events().join("; ")));
            if summary.chapter_id == origin {
                found_origin = true;
                break;
            }
        }
        if !found_origin {
            warn!(origin = %origin, "Origin chapter not found; using all main summaries");
        }
        for summary in &branch_chapters {
            sections.push(format!(
                "CHAPTER {} (Branch): {}",
                summary.chapter_id,
                summary.events().join("; ")
            ));
        }
        let joined = sections.join("\n\n");
        let story_context = tail_chars(&joined, self.config().context.story_context_chars);

        let next_number = match branch_chapters.last() {
            Some(last) => keys::chapter_number(&last.chapter_id).map(|n| n + 1),
            None => keys::chapter_number(&origin).map(|n| n + 1),
        }
        .unwrap_or(1);
        let new_chapter = keys::chapter_id(next_number);
        let key = keys::summary_in(&namespace, &new_chapter);
        if self.store().exists(&key).await? {
            report.skip();
            return Ok(report);
        }

        let (introduce, force) = self.branch_overrides(branch_id).await?;
        let context = prompts::branch_generation_context(story_context, &branch, &introduce, &force);

        let (mut document, health) = self
            .simulate_chapter(&new_chapter, &context, prompts::BRANCH_HINT)
            .await?;
        document["timeline_origin"] = Value::String(branch_id.to_string());
        self.persist_json(&mut report, &new_chapter, &key, &document, health)
            .await?;
        Ok(report)
    }

    /// New characters and forced decisions from an optional branch config.
    async fn branch_overrides(&self, branch_id: &str) -> MangaweaveResult<(Vec<Value>, Vec<Value>)> {
        let key = keys::branch_config(branch_id);
        let shape = self.shape(names::BRANCH_CONFIG)?;
        Ok(match self.load_payload(&key, &shape).await? {
            Some(config) => {
                info!(key = %key, "Applying branch config");
                (
                    config.list("introduce_characters").to_vec(),
                    config.list("force_decisions").to_vec(),
                )
            }
            None => (Vec::new(), Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_ids_are_one_based_and_padded() {
        assert_eq!(suggested_branch_id("ch_005_a001", 0), "ch_005_a001_b01");
        assert_eq!(suggested_branch_id("ch_005_a001", 11), "ch_005_a001_b12");
    }
}
