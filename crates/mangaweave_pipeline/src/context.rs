//! Bounded text buffers for prompt context.

/// Prefix placed in front of a context whose head was cut off.
pub const TRUNCATION_MARKER: &str = "Story Start (Truncated)...\n";

/// The last `n` characters of `s`, on a character boundary.
///
/// ```
/// use mangaweave_pipeline::tail_chars;
///
/// assert_eq!(tail_chars("こんにちは", 2), "ちは");
/// assert_eq!(tail_chars("abc", 10), "abc");
/// ```
pub fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

/// The first `n` characters of `s`, on a character boundary.
///
/// ```
/// use mangaweave_pipeline::head_chars;
///
/// assert_eq!(head_chars("こんにちは", 2), "こん");
/// ```
pub fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Append-and-truncate-from-front story buffer.
///
/// Threaded through a stage loop by value: each `append` consumes the
/// context and returns the next one. When the text exceeds the budget
/// (counted in characters), only the last `budget` characters are kept,
/// behind [`TRUNCATION_MARKER`].
///
/// # Example
///
/// ```
/// use mangaweave_pipeline::RollingContext;
///
/// let context = RollingContext::new("Story Start.", 15_000)
///     .append("[Chapter ch_001 Summary]\nThe hero leaves home.");
/// assert!(context.contains("[Chapter ch_001 Summary]"));
/// assert!(context.as_str().starts_with("Story Start.\n\n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingContext {
    text: String,
    budget: usize,
}

impl RollingContext {
    /// Start a context from `seed`.
    pub fn new(seed: impl Into<String>, budget: usize) -> Self {
        Self {
            text: seed.into(),
            budget,
        }
    }

    /// Append a section after a blank line, truncating from the front when over budget.
    pub fn append(self, section: &str) -> Self {
        let Self { mut text, budget } = self;
        text.push_str("\n\n");
        text.push_str(section);

        if text.chars().count() > budget {
            text = format!("{}{}", TRUNCATION_MARKER, tail_chars(&text, budget));
        }

        Self { text, budget }
    }

    /// Whether `marker` occurs in the buffer.
    pub fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    /// Current text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Character budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Consume the context, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for RollingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
