//! Stage prompt builders.
//!
//! Field contracts are appended by the generation loop, so these prompts
//! describe the task and carry the context only.

use crate::context::tail_chars;
use serde_json::Value;

pub(crate) const CHAPTER_START: &str =
    "This is the beginning of the chapter; no prior pages have been summarized yet.";
pub(crate) const CONTINUE_HINT: &str = "Continue the main story.";
pub(crate) const BRANCH_HINT: &str = "First chapter of a new timeline after the divergence.";
const STYLE_GUIDE: &str = "Match original author's pacing as closely as possible.";

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn describe_batch(
    chapter_id: &str,
    story_so_far: &str,
    first_page: usize,
    last_page: usize,
    total_pages: usize,
) -> String {
    let count = last_page + 1 - first_page;
    format!(
        "You are an expert manga analyst. We are analyzing chapter {chapter_id} in multiple \
         batches to respect context limits. Reading direction is right to left, top to down.\n\n\
         STORY SO FAR (earlier pages of this chapter):\n{story_so_far}\n\n\
         Now you will see ONLY pages {first_page}-{last_page} out of {total_pages}. Focus on \
         these pages while keeping the STORY SO FAR in mind to maintain continuity.\n\n\
         Describe:\n\
         - events: key plot events occurring in THESE pages only\n\
         - dialogues: key dialogue summaries from THESE pages only\n\
         - visual_details: setting and atmosphere\n\
         - page_summaries: an elaborate panel-by-panel narration of EACH page in this batch, \
         in order, exactly {count} entries, page_number counting from {first_page}"
    )
}

pub(crate) fn refine(chapter_id: &str, summary: &Value, global_context: &str) -> String {
    format!(
        "You are refining an earlier interpretation of a manga chapter, now that you have full \
         context of later chapters.\n\n\
         GLOBAL STORY CONTEXT (all chapters so far):\n{global_context}\n\n\
         RAW SUMMARY FOR CHAPTER {chapter_id} (possibly imperfect):\n{summary}\n\n\
         TASK:\n\
         - Correct mistakes in the chapter's events and dialogues in light of the global story.\n\
         - Add missing but important beats that are strongly implied by later chapters.\n\
         - Keep the same structure and the chapter_id \"{chapter_id}\".",
        summary = pretty(summary),
    )
}

pub(crate) fn prose(chapter_id: &str, summary: &Value, story_so_far: &str) -> String {
    format!(
        "You are an expert light-novel writer adapting manga into prose.\n\n\
         You are given a brief STORY SO FAR from previous chapters and a STRUCTURED DESCRIPTION \
         of the current chapter.\n\n\
         Your task:\n\
         - Write chapter {chapter_id} as novel-style prose in third person.\n\
         - Preserve ALL important plot beats, character actions and emotional shifts.\n\
         - Do NOT invent major new events that contradict the summary.\n\
         - Small connective tissue (thoughts, transitions) is fine as long as it fits.\n\
         - Handle violence or mature content with emotional depth and narrative impact, \
         without gratuitous or pornographic detail.\n\n\
         Output ONLY the prose of this chapter. No headings, no JSON, no analysis.\n\n\
         STORY SO FAR:\n{story_so_far}\n\n\
         STRUCTURED DESCRIPTION OF CURRENT CHAPTER (JSON):\n{summary}",
        summary = pretty(summary),
    )
}

pub(crate) fn synopsis(chapter_text: &str) -> String {
    format!(
        "Summarize the following chapter prose into a concise ~300-word synopsis.\n\
         Focus ONLY on plot progression, character development, and key reveals.\n\n\
         TEXT:\n{chapter_text}"
    )
}

pub(crate) fn story_index(compact_summaries: &str) -> String {
    format!(
        "You are to analyze an entire manga story from chapter summaries.\n\
         Use the compact summaries below to infer ordering, intent, arcs, and themes.\n\n\
         CHAPTER SUMMARIES (compact):\n{compact_summaries}\n\n\
         Produce ordered chapter entries (id, number, optional title and timeframe, key \
         locations and characters, summary, chapter_intent), the plot arcs spanning the work \
         and its recurring themes."
    )
}

pub(crate) fn anchors(chapter_id: &str, chapter_text: &str) -> String {
    format!(
        "You are a story analyst.\n\n\
         Given the following chapter text for {chapter_id}, identify the key ANCHOR EVENTS that \
         significantly change the story's direction, stakes, or relationships.\n\n\
         For each anchor use an anchor_id like \"{chapter_id}_a001\", a one-sentence summary, the \
         characters involved, its cause, immediate effect and long-term impact, an \
         importance_score from 1 to 5 and a branching_potential from 1 to 5 (how plausible it is \
         that the story could have gone differently here).\n\n\
         The anchors list should be non-empty unless the chapter truly has no anchor-level \
         events.\n\n\
         CHAPTER TEXT:\n\"\"\"\n{chapter_text}\n\"\"\""
    )
}

pub(crate) fn branches(anchor: &Value, story_context: &str, character_context: &str) -> String {
    format!(
        "You are a Narrative Designer for a high-stakes Manga/Light Novel adaptation. You \
         specialize in designing route splits (divergent timelines).\n\n\
         ### CONTEXT\n\
         1. STORY SO FAR:\n{story_context}\n\n\
         2. CHARACTER PROFILES (if any):\n{character_context}\n\n\
         ### THE ANCHOR EVENT (current canonical outcome)\n{anchor}\n\n\
         ### YOUR TASK\n\
         Generate 3 divergent timelines where this event plays out differently. Do not suggest \
         trivial changes. Suggest changes that alter the narrative flow, character \
         relationships, or eventual outcome.\n\n\
         Use one branch of each type: Behavioral (a character decides differently), BadEnd (the \
         route that ends badly) and Wildcard (an external factor or interruption). \
         trigger_character is a name or 'Environment'; short_effect is 1-2 sentences.",
        anchor = pretty(anchor),
    )
}

pub(crate) fn characters(full_story_text: &str) -> String {
    format!(
        "You are a character analyst.\n\n\
         Given the FULL STORY TEXT below, identify the main characters and produce a CHARACTER \
         BIBLE. Use short character ids like \"c0\", \"c1\". For relationships give objects with \
         \"to\" (character name or id), \"type\" (friend, rival, romantic interest...) and \"arc\" \
         (how the relationship changes). arc_summary lists the major beats of their personal arc.\n\n\
         FULL STORY TEXT:\n\"\"\"\n{full_story_text}\n\"\"\""
    )
}

pub(crate) fn scales(
    chapter_id: &str,
    chapter_text: &str,
    bounds: &mangaweave_schema::ScaleBounds,
) -> String {
    format!(
        "You are a content classifier.\n\n\
         Given the chapter text below, rate erotism_score ({}-{}), romance_score ({}-{}) and \
         action_score ({}-{}), give genre_labels such as [\"romance\"] or [\"shonen\"] and brief \
         content_labels (e.g. \"violence\", \"nudity\"), if any.\n\n\
         If there is sexual content, identify and label it appropriately, but do not include \
         explicit sexual description in the output.\n\n\
         CHAPTER {chapter_id} TEXT:\n\"\"\"\n{chapter_text}\n\"\"\"",
        bounds.erotism_min,
        bounds.erotism_max,
        bounds.romance_min,
        bounds.romance_max,
        bounds.action_min,
        bounds.action_max,
    )
}

pub(crate) fn chapter_plan(chapter_id: &str, story_context: &str, target_pages: usize) -> String {
    format!(
        "You are the series editor for a long-running manga.\n\n\
         We are planning the NEXT CHAPTER {chapter_id}. The story so far is:\n\n{story_context}\n\n\
         TASK:\n\
         1. Identify the main ongoing story arcs and unresolved questions.\n\
         2. Decide the specific PURPOSE of the next chapter.\n\
         3. Design 3-4 acts for this chapter across ~{target_pages} pages. For each act give a \
         page_range inside 1-{target_pages} such as \"1-5\", an objective, the focus_characters \
         and the arc_focus (which story arcs this act pushes).\n\n\
         Use chapter_id \"{chapter_id}\" and a short working title."
    )
}

pub(crate) fn simulated_batch(
    chapter_id: &str,
    first_page: usize,
    last_page: usize,
    act_context: &str,
    story_so_far: &str,
) -> String {
    let count = last_page + 1 - first_page;
    format!(
        "You are simulating a Manga Chapter.\n\
         You are strictly writing the SCRIPT/SUMMARY for Pages {first_page} to {last_page} of \
         chapter {chapter_id}.\n\n\
         ACT CONTEXT:\n{act_context}\n\n\
         STORY SO FAR (immediate context):\n{story_so_far}\n\n\
         STYLE:\n{STYLE_GUIDE}\n\n\
         TASK:\n\
         Generate a detailed breakdown for exactly {count} pages: the key events, the key \
         dialogue beats and one page_summaries entry per page with a full description of \
         visuals and action, page_number counting from {first_page}.",
        story_so_far = tail_chars(story_so_far, 1500),
    )
}

pub(crate) fn visual_summary(chapter_id: &str, page_summaries: &str) -> String {
    format!(
        "You are summarizing the visuals of a manga chapter.\n\n\
         Based on the following page summaries for chapter {chapter_id}, describe:\n\
         1. Overall setting (locations, environments, recurring places).\n\
         2. Overall atmosphere (tone, mood, pacing).\n\n\
         PAGE SUMMARIES:\n{page_summaries}"
    )
}

pub(crate) fn act_context(
    chapter_purpose: &str,
    objective: &str,
    focus_characters: &[String],
    arc_focus: &[String],
) -> String {
    format!(
        "Chapter Purpose: {chapter_purpose}\n\
         Act Objective: {objective}\n\
         Focus Characters: {}\n\
         Arc Focus: {}",
        focus_characters.join(", "),
        arc_focus.join(", "),
    )
}

pub(crate) fn branch_generation_context(
    story_context: &str,
    branch: &Value,
    introduce_characters: &[Value],
    force_decisions: &[Value],
) -> String {
    let field = |name: &str| branch.get(name).and_then(Value::as_str).unwrap_or_default();

    let mut extras = String::new();
    if !introduce_characters.is_empty() {
        extras.push_str("\nNEW CHARACTERS INTRODUCED IN THIS TIMELINE:\n");
        for character in introduce_characters {
            extras.push_str(&format!("- {}\n", character));
        }
    }
    if !force_decisions.is_empty() {
        extras.push_str("\nFORCED DECISIONS IN THIS TIMELINE:\n");
        for decision in force_decisions {
            extras.push_str(&format!("- {}\n", decision));
        }
    }

    format!(
        "MAIN STORY SO FAR (up to the divergence point):\n{story_context}\n\n\
         BRANCH DIVERGENCE (what-if):\n\
         Type: {}\n\
         What-If: {}\n\
         Immediate Effect: {}\n\
         Long-Term Effect: {}\n\n\
         {extras}",
        field("branch_type"),
        field("what_if"),
        field("short_effect"),
        field("long_effect"),
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_branch_context_lists_overrides() {
        let branch = json!({
            "branch_type": "BadEnd",
            "what_if": "The bridge collapses",
            "short_effect": "Aoi falls",
            "long_effect": "The guild dissolves",
        });
        let context = branch_generation_context(
            "CHAPTER ch_001: a; b",
            &branch,
            &[json!({"name": "Rin"})],
            &[json!({"ch_003": "Aoi refuses"})],
        );

        assert!(context.starts_with("MAIN STORY SO FAR"));
        assert!(context.contains("Type: BadEnd\nWhat-If: The bridge collapses"));
        assert!(context.contains("NEW CHARACTERS INTRODUCED IN THIS TIMELINE:\n- {\"name\":\"Rin\"}"));
        assert!(context.contains("FORCED DECISIONS IN THIS TIMELINE:"));
    }

    #[test]
    fn test_simulated_batch_trims_story_so_far() {
        let long = "x".repeat(5000);
        let prompt = simulated_batch("ch_010", 11, 18, "act", &long);
        assert!(prompt.contains("exactly 8 pages"));
        assert!(!prompt.contains(&"x".repeat(1501)));
    }
}
