//! Prompt text shared by every structured call.

use mangaweave_error::ValidationError;
use mangaweave_schema::Shape;

/// Append the output contract for `shape` to a stage prompt.
///
/// The contract names every field of the shape and lists their types,
/// so the model sees the exact record it has to produce.
pub fn augment_prompt(prompt: &str, shape: &Shape) -> String {
    let names = serde_json::to_string(&shape.field_names()).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{prompt}\n\n\
         You MUST respond with ONLY a single valid JSON object. \
         Use exactly the fields from this schema and no others: {names}. \
         Do not include commentary or code fences.\n\n\
         Field types:\n{fields}",
        fields = shape.describe(),
    )
}

/// Build the follow-up prompt after a candidate failed validation.
///
/// Carries the augmented instruction, the rejected candidate and every
/// violation, one per line.
pub fn corrective_prompt(instruction: &str, candidate: &str, error: &ValidationError) -> String {
    format!(
        "{instruction}\n\n\
         The previous JSON was invalid for the expected schema. \
         Please return corrected JSON only, no commentary.\n\n\
         Invalid JSON was:\n{candidate}\n\n\
         Validation errors:\n{listing}",
        listing = error.listing(),
    )
}
