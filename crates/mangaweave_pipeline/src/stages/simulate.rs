//! Chapter simulation for story continuation and branch timelines.
//!
//! A simulated chapter is planned first (purpose plus acts over page ranges),
//! then written in page batches with the matching act as guidance, and finally
//! given an overall visual summary. The result has the same form as a chapter
//! described from real pages.

use super::describe::ChapterAccumulator;
use crate::context::tail_chars;
use crate::pipeline::{UnitHealth, strings};
use crate::prompts;
use crate::Pipeline;
use mangaweave_error::MangaweaveResult;
use mangaweave_interface::MangaweaveDriver;
use mangaweave_schema::{Payload, names, validate_value};
use mangaweave_storage::ArtifactStore;
use serde_json::Value;
use tracing::{debug, info, instrument};

const ROLLING_SUMMARY_CHARS: usize = 2000;
const RECENT_EVENTS: usize = 3;

/// Inclusive page bounds of an act's `"a-b"` page range.
fn parse_page_range(range: &str) -> Option<(usize, usize)> {
    let (start, end) = range.split_once('-')?;
    let start = start.trim().parse().ok()?;
    let end = end.trim().parse().ok()?;
    Some((start, end))
}

/// The act whose page range contains `page`, if any.
fn act_for_page(acts: &[Value], page: usize) -> Option<&Value> {
    acts.iter().find(|act| {
        act.get("page_range")
            .and_then(Value::as_str)
            .and_then(parse_page_range)
            .is_some_and(|(start, end)| start <= page && page <= end)
    })
}

fn act_guidance(purpose: &str, act: Option<&Value>) -> String {
    match act {
        Some(act) => prompts::act_context(
            purpose,
            act.get("objective").and_then(Value::as_str).unwrap_or_default(),
            &strings(act, "focus_characters"),
            &strings(act, "arc_focus"),
        ),
        None => format!("Chapter-purpose continuation: {}", purpose),
    }
}

fn recent_events(chapter_id: &str, events: &[String]) -> String {
    let start = events.len().saturating_sub(RECENT_EVENTS);
    format!("Recent events in {}: {}", chapter_id, events[start..].join("; "))
}

impl<D, S> Pipeline<D, S>
where
    D: MangaweaveDriver + Clone,
    S: ArtifactStore,
{
    /// Simulate one chapter from a story context.
    ///
    /// `hint` stands in for the chapter purpose when the plan leaves it empty.
    /// The returned document conforms to `chapter_summary`; the health records
    /// every call that degraded along the way.
    #[instrument(skip(self, story_context, hint))]
    pub(crate) async fn simulate_chapter(
        &self,
        chapter_id: &str,
        story_context: &str,
        hint: &str,
    ) -> MangaweaveResult<(Value, UnitHealth)> {
        let config = self.config();
        let temperatures = config.generation.temperatures;
        let target_pages = config.continuation.target_pages.max(1);
        let batch_size = config.batch.page_batch_size.max(1);
        let mut health = UnitHealth::default();

        let plan_prompt = prompts::chapter_plan(
            chapter_id,
            tail_chars(story_context, config.context.story_context_chars),
            target_pages,
        );
        let plan = health.take(
            "chapter plan",
            self.text()
                .generate_validated(
                    &plan_prompt,
                    &*self.shape(names::CHAPTER_PLAN)?,
                    self.max_attempts(),
                    temperatures.plan,
                )
                .await,
        );
        let purpose = match plan.str("chapter_purpose").trim() {
            "" => hint.to_string(),
            p => p.to_string(),
        };
        let acts = plan.list("acts");
        info!(chapter = chapter_id, acts = acts.len(), purpose = %purpose, "Chapter planned");

        let batch_shape = self.shape(names::PAGE_BATCH)?;
        let mut chapter = ChapterAccumulator::default();
        let mut rolling = tail_chars(story_context, ROLLING_SUMMARY_CHARS).to_string();
        let mut current_page = 1;

        while current_page <= target_pages {
            let last_page = (current_page + batch_size - 1).min(target_pages);
            let guidance = act_guidance(&purpose, act_for_page(acts, current_page));
            debug!(chapter = chapter_id, current_page, last_page, "Simulating pages");

            let prompt = prompts::simulated_batch(chapter_id, current_page, last_page, &guidance, &rolling);
            let batch: Payload = health.take(
                "page batch",
                self.text()
                    .generate_validated(&prompt, &batch_shape, self.max_attempts(), temperatures.page_batch)
                    .await,
            );
            chapter.fold(&batch, current_page);

            let batch_events = batch.strings("events");
            if !batch_events.is_empty() {
                rolling = recent_events(chapter_id, &batch_events);
            }
            current_page = last_page + 1;
        }

        let page_lines = chapter
            .page_summaries()
            .iter()
            .map(|page| {
                format!(
                    "Page {}: {}",
                    page.get("page_number").and_then(Value::as_u64).unwrap_or_default(),
                    page.get("text").and_then(Value::as_str).unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let visual = health.take(
            "visual summary",
            self.text()
                .generate_validated(
                    &prompts::visual_summary(chapter_id, &page_lines),
                    &*self.shape(names::VISUAL_DETAILS)?,
                    self.max_attempts(),
                    temperatures.visual,
                )
                .await,
        );
        chapter.set_visual(visual.str("setting"), visual.str("atmosphere"));

        let document = chapter.into_document(chapter_id);
        let document = match validate_value(&document, &*self.shape(names::CHAPTER_SUMMARY)?) {
            Ok(payload) => payload.into_value(),
            Err(e) => {
                health.note(format!("simulated chapter does not conform: {}", e.listing()));
                document
            }
        };
        Ok((document, health))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_range() {
        assert_eq!(parse_page_range("1-5"), Some((1, 5)));
        assert_eq!(parse_page_range(" 6 - 12 "), Some((6, 12)));
        assert_eq!(parse_page_range("7"), None);
        assert_eq!(parse_page_range("a-b"), None);
    }

    #[test]
    fn test_act_for_page_picks_containing_range() {
        let acts = vec![
            json!({"act_id": 1, "page_range": "1-5", "objective": "open"}),
            json!({"act_id": 2, "page_range": "6-12", "objective": "clash"}),
            json!({"act_id": 3, "page_range": "bogus"}),
        ];
        assert_eq!(act_for_page(&acts, 1).map(|a| a["act_id"].clone()), Some(json!(1)));
        assert_eq!(act_for_page(&acts, 11).map(|a| a["act_id"].clone()), Some(json!(2)));
        assert!(act_for_page(&acts, 13).is_none());
    }

    #[test]
    fn test_act_guidance_falls_back_to_purpose() {
        assert_eq!(
            act_guidance("Reunite the team", None),
            "Chapter-purpose continuation: Reunite the team"
        );
        let act = json!({"objective": "Escape", "focus_characters": ["Mio"], "arc_focus": []});
        let guidance = act_guidance("Reunite the team", Some(&act));
        assert!(guidance.contains("Act Objective: Escape"));
        assert!(guidance.contains("Focus Characters: Mio"));
    }

    #[test]
    fn test_recent_events_keeps_last_three() {
        let events: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(recent_events("ch_004", &events), "Recent events in ch_004: b; c; d");
    }
}
