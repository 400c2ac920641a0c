//! Shapes of every structured document the pipeline asks a model for.

use crate::{Coercion, Field, FieldType, Shape};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Registry names of the built-in shapes.
pub mod names {
    /// Setting and atmosphere of a chapter
    pub const VISUAL_DETAILS: &str = "visual_details";
    /// One numbered page narration
    pub const PAGE_SUMMARY: &str = "page_summary";
    /// Structured description of a whole chapter
    pub const CHAPTER_SUMMARY: &str = "chapter_summary";
    /// Description of one batch of pages
    pub const PAGE_BATCH: &str = "page_batch";
    /// Plot anchor event
    pub const ANCHOR: &str = "anchor";
    /// Anchors of one chapter
    pub const ANCHOR_LIST: &str = "anchor_list";
    /// Stored branch suggestion
    pub const BRANCH_OPTION: &str = "branch_option";
    /// Branch suggestion as generated, before ids are assigned
    pub const BRANCH_DRAFT: &str = "branch_draft";
    /// Generated list of branch drafts
    pub const BRANCH_LIST: &str = "branch_list";
    /// All branch suggestions keyed by anchor
    pub const BRANCH_SUGGESTIONS: &str = "branch_suggestions";
    /// Operator overrides for a branch timeline
    pub const BRANCH_CONFIG: &str = "branch_config";
    /// Character bible entry
    pub const CHARACTER: &str = "character";
    /// All characters
    pub const CHARACTER_BIBLE: &str = "character_bible";
    /// Content ratings of a chapter
    pub const CHAPTER_SCALES: &str = "chapter_scales";
    /// Story index entry
    pub const CHAPTER_INDEX_ENTRY: &str = "chapter_index_entry";
    /// Whole-story index
    pub const STORY_INDEX: &str = "story_index";
    /// Act of a planned chapter
    pub const CHAPTER_ACT: &str = "chapter_act";
    /// Plan of a simulated chapter
    pub const CHAPTER_PLAN: &str = "chapter_plan";
    /// Editorial plan of a mainline chapter
    pub const MAINLINE_PLAN: &str = "mainline_plan";
    /// Editorial plan of a branch chapter
    pub const BRANCH_PLAN: &str = "branch_plan";
}

/// Inclusive bounds of the chapter content ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleBounds {
    /// Lower bound of `erotism_score`
    pub erotism_min: i64,
    /// Upper bound of `erotism_score`
    pub erotism_max: i64,
    /// Lower bound of `romance_score`
    pub romance_min: i64,
    /// Upper bound of `romance_score`
    pub romance_max: i64,
    /// Lower bound of `action_score`
    pub action_min: i64,
    /// Upper bound of `action_score`
    pub action_max: i64,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            erotism_min: 0,
            erotism_max: 5,
            romance_min: 0,
            romance_max: 5,
            action_min: 0,
            action_max: 5,
        }
    }
}

pub(crate) fn visual_details() -> Shape {
    Shape::new(names::VISUAL_DETAILS)
        .optional("setting", FieldType::String, "")
        .optional("atmosphere", FieldType::String, "")
}

fn visual_details_field() -> Field {
    Field::optional(
        "visual_details",
        FieldType::record(visual_details()),
        json!({"setting": "", "atmosphere": ""}),
    )
}

pub(crate) fn page_summary() -> Shape {
    Shape::new(names::PAGE_SUMMARY)
        .required("page_number", FieldType::Integer { min: Some(1), max: None })
        .required("text", FieldType::String)
}

fn page_summaries_field(required: bool) -> Field {
    let field_type = FieldType::list(FieldType::record(page_summary()));
    let field = if required {
        Field::required("page_summaries", field_type)
    } else {
        Field::optional("page_summaries", field_type, json!([]))
    };
    field.with_coercion(Coercion::IndexedText {
        number_field: "page_number".to_string(),
        text_field: "text".to_string(),
    })
}

pub(crate) fn chapter_summary() -> Shape {
    Shape::new(names::CHAPTER_SUMMARY)
        .required("chapter_id", FieldType::String)
        .optional("events", FieldType::string_list(), json!([]))
        .optional("dialogues", FieldType::string_list(), json!([]))
        .with(visual_details_field())
        .with(page_summaries_field(false))
        .nullable("coverage_notes", FieldType::String)
        .nullable("confidence_score", FieldType::float_range(0.0, 1.0))
        .nullable("timeline_origin", FieldType::String)
}

pub(crate) fn page_batch() -> Shape {
    Shape::new(names::PAGE_BATCH)
        .required("events", FieldType::string_list())
        .optional("dialogues", FieldType::string_list(), json!([]))
        .with(visual_details_field())
        .with(page_summaries_field(true))
}

pub(crate) fn anchor() -> Shape {
    Shape::new(names::ANCHOR)
        .required("anchor_id", FieldType::String)
        .required("chapter_id", FieldType::String)
        .required("summary", FieldType::String)
        .required("characters", FieldType::string_list())
        .required("cause", FieldType::String)
        .required("immediate_effect", FieldType::String)
        .required("long_term_impact", FieldType::String)
        .required("importance_score", FieldType::integer(1, 5))
        .required("branching_potential", FieldType::integer(1, 5))
}

pub(crate) fn anchor_list() -> Shape {
    Shape::new(names::ANCHOR_LIST).required("anchors", FieldType::list(FieldType::record(anchor())))
}

fn branch_type() -> FieldType {
    FieldType::one_of(["Behavioral", "BadEnd", "Wildcard", "Custom"])
}

fn branch_body(shape: Shape) -> Shape {
    shape
        .required("branch_type", branch_type())
        .required("what_if", FieldType::String)
        .required("trigger_character", FieldType::String)
        .required("short_effect", FieldType::String)
        .required("long_effect", FieldType::String)
        .nullable("tone", FieldType::String)
        .optional("new_characters", FieldType::list(FieldType::Object), json!([]))
        .optional("forced_decisions", FieldType::string_list(), json!([]))
}

pub(crate) fn branch_option() -> Shape {
    branch_body(
        Shape::new(names::BRANCH_OPTION)
            .required("branch_id", FieldType::String)
            .required("anchor_id", FieldType::String),
    )
}

pub(crate) fn branch_draft() -> Shape {
    branch_body(Shape::new(names::BRANCH_DRAFT))
}

pub(crate) fn branch_list() -> Shape {
    Shape::new(names::BRANCH_LIST)
        .required("branches", FieldType::list(FieldType::record(branch_draft())))
}

pub(crate) fn branch_suggestions() -> Shape {
    Shape::new(names::BRANCH_SUGGESTIONS).optional(
        "branches_by_anchor",
        FieldType::map(FieldType::list(FieldType::record(branch_option()))),
        json!({}),
    )
}

pub(crate) fn branch_config() -> Shape {
    Shape::new(names::BRANCH_CONFIG)
        .required("branch_id", FieldType::String)
        .optional(
            "introduce_characters",
            FieldType::list(FieldType::Object),
            json!([]),
        )
        .optional(
            "force_decisions",
            FieldType::list(FieldType::map(FieldType::String)),
            json!([]),
        )
}

pub(crate) fn character() -> Shape {
    Shape::new(names::CHARACTER)
        .required("character_id", FieldType::String)
        .required("names", FieldType::string_list())
        .required("role", FieldType::String)
        .optional("appearance", FieldType::String, "")
        .optional("personality", FieldType::String, "")
        .optional("relationships", FieldType::list(FieldType::Object), json!([]))
        .optional("arc_summary", FieldType::string_list(), json!([]))
}

pub(crate) fn character_bible() -> Shape {
    Shape::new(names::CHARACTER_BIBLE)
        .required("characters", FieldType::list(FieldType::record(character())))
}

pub(crate) fn chapter_scales(bounds: &ScaleBounds) -> Shape {
    Shape::new(names::CHAPTER_SCALES)
        .optional("chapter_id", FieldType::String, "")
        .required(
            "erotism_score",
            FieldType::integer(bounds.erotism_min, bounds.erotism_max),
        )
        .required(
            "romance_score",
            FieldType::integer(bounds.romance_min, bounds.romance_max),
        )
        .required(
            "action_score",
            FieldType::integer(bounds.action_min, bounds.action_max),
        )
        .optional("genre_labels", FieldType::string_list(), json!([]))
        .optional("content_labels", FieldType::string_list(), json!([]))
}

pub(crate) fn chapter_index_entry() -> Shape {
    Shape::new(names::CHAPTER_INDEX_ENTRY)
        .required("chapter_id", FieldType::String)
        .required("chapter_number", FieldType::Integer { min: Some(1), max: None })
        .nullable("title", FieldType::String)
        .nullable("timeframe_label", FieldType::String)
        .optional("primary_locations", FieldType::string_list(), json!([]))
        .optional("primary_characters", FieldType::string_list(), json!([]))
        .required("summary", FieldType::String)
        .required("chapter_intent", FieldType::String)
}

pub(crate) fn story_index() -> Shape {
    Shape::new(names::STORY_INDEX)
        .required(
            "chapters",
            FieldType::list(FieldType::record(chapter_index_entry())),
        )
        .optional("global_arcs", FieldType::string_list(), json!([]))
        .optional("recurring_themes", FieldType::string_list(), json!([]))
}

pub(crate) fn chapter_act() -> Shape {
    Shape::new(names::CHAPTER_ACT)
        .required("act_id", FieldType::Integer { min: Some(1), max: None })
        .required("page_range", FieldType::String)
        .optional("objective", FieldType::String, "")
        .optional("focus_characters", FieldType::string_list(), json!([]))
        .optional("arc_focus", FieldType::string_list(), json!([]))
}

pub(crate) fn chapter_plan() -> Shape {
    Shape::new(names::CHAPTER_PLAN)
        .optional("chapter_id", FieldType::String, "")
        .optional("title", FieldType::String, "")
        .required("chapter_purpose", FieldType::String)
        .required("acts", FieldType::list(FieldType::record(chapter_act())))
}

pub(crate) fn mainline_plan() -> Shape {
    Shape::new(names::MAINLINE_PLAN)
        .required("chapter_id", FieldType::String)
        .optional("objectives", FieldType::string_list(), json!([]))
        .optional("beats", FieldType::string_list(), json!([]))
        .nullable("notes", FieldType::String)
        .nullable("timeframe_hint", FieldType::String)
        .optional("global_arcs", FieldType::string_list(), json!([]))
}

pub(crate) fn branch_plan() -> Shape {
    Shape::new(names::BRANCH_PLAN)
        .required("branch_id", FieldType::String)
        .required("chapter_plan", FieldType::record(mainline_plan()))
        .nullable("divergence_notes", FieldType::String)
}
