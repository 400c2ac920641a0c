//! Recovery of a JSON object from noisy model output.
//!
//! Responses often wrap the object in markdown fences or surround it with
//! commentary, and truncated responses leave unbalanced braces behind.

use regex::Regex;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*\s*(.*?)\s*```").expect("Valid fence regex")
});

/// Extract the most plausible JSON object text from a response.
///
/// 1. Fenced code blocks are replaced by their trimmed content.
/// 2. Every maximal brace-balanced `{...}` region is collected; braces inside
///    string literals are ignored, and an opening brace that never closes is
///    skipped so complete objects nested inside it are still found.
/// 3. The longest region wins (the earliest one on ties).
/// 4. Otherwise the span from the first `{` to the last `}` is returned.
/// 5. Otherwise `"{}"`.
///
/// Never fails.
///
/// # Examples
///
/// ```
/// use mangaweave_generation::extract_json;
///
/// let response = "Sure!\n```json\n{\"events\": [\"a\"]}\n```\nAnything else?";
/// assert_eq!(extract_json(response), "{\"events\": [\"a\"]}");
///
/// assert_eq!(extract_json("no object here"), "{}");
/// ```
pub fn extract_json(response: &str) -> String {
    let text = FENCE.replace_all(response, "$1");

    let longest = balanced_regions(&text)
        .into_iter()
        .fold(None::<&str>, |best, candidate| match best {
            Some(b) if b.len() >= candidate.len() => Some(b),
            _ => Some(candidate),
        });
    if let Some(found) = longest {
        return found.to_string();
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && end > start
    {
        return text[start..=end].to_string();
    }

    let preview: String = response.chars().take(200).collect();
    tracing::warn!(
        response_length = response.len(),
        preview = %preview,
        "No JSON object found in response"
    );
    "{}".to_string()
}

/// All maximal balanced `{...}` regions, in order of appearance.
fn balanced_regions(text: &str) -> Vec<&str> {
    let mut regions = Vec::new();
    let mut from = 0;

    while let Some(offset) = text[from..].find('{') {
        let start = from + offset;
        match balanced_end(text, start) {
            Some(end) => {
                regions.push(&text[start..=end]);
                from = end + 1;
            }
            None => from = start + 1,
        }
    }

    regions
}

/// Byte index of the `}` closing the `{` at `start`, if it closes.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_block_with_prose() {
        let response = r#"
Here's the JSON you requested:

```json
{
  "id": 123,
  "name": "Test"
}
```

Hope this helps!
"#;
        assert_eq!(extract_json(response), "{\n  \"id\": 123,\n  \"name\": \"Test\"\n}");
    }

    #[test]
    fn test_extract_fence_without_language() {
        let response = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(response), "{\"a\": 1}");
    }

    #[test]
    fn test_longest_of_several_objects_wins() {
        let response = r#"First {"a": 1} then {"b": {"c": [1, 2, 3]}} and {"d": 4}"#;
        assert_eq!(extract_json(response), r#"{"b": {"c": [1, 2, 3]}}"#);
    }

    #[test]
    fn test_tie_keeps_first() {
        assert_eq!(extract_json(r#"{"a": 1} {"b": 2}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_braces_inside_strings_do_not_count() {
        let object = r#"{"text": "she drew a } and a { on the wall", "n": 2}"#;
        let response = format!("Result: {} done", object);
        assert_eq!(extract_json(&response), object);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let object = r#"{"quote": "he said \"{hi}\"", "ok": true}"#;
        assert_eq!(extract_json(object), object);
    }

    #[test]
    fn test_truncated_outer_object_yields_inner_complete_one() {
        let response = r#"{"chapter_id": "ch_001", "visual_details": {"setting": "school"}, "events": ["a"#;
        assert_eq!(extract_json(response), r#"{"setting": "school"}"#);
    }

    #[test]
    fn test_fallback_spans_first_to_last_brace() {
        // Mismatched quote keeps every region open, so no balanced candidate exists.
        let response = r#"junk {"a": "unterminated } tail"#;
        assert_eq!(extract_json(response), r#"{"a": "unterminated }"#);
    }

    #[test]
    fn test_no_braces_returns_empty_object() {
        assert_eq!(extract_json("I cannot help with that."), "{}");
        assert_eq!(extract_json("} backwards {"), "{}");
    }

    #[test]
    fn test_serialized_object_is_returned_verbatim() {
        let value = serde_json::json!({"events": ["a}", "b{"], "nested": {"k": "ü"}});
        let text = serde_json::to_string(&value).unwrap();
        let wrapped = format!("Answer:\n```json\n{}\n```\nthanks", text);
        assert_eq!(extract_json(&wrapped), text);
    }
}
