//! Derived post fields: plain-text extraction, excerpts, and read-time estimates.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Number of plain-text characters kept by an auto-derived excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// Suffix appended to every auto-derived excerpt.
pub const EXCERPT_ELLIPSIS: &str = "...";

/// Reading speed used by the read-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Remove every `<...>` markup sequence from the content.
pub fn strip_tags(content: &str) -> String {
    MARKUP_TAG.replace_all(content, "").into_owned()
}

/// Build the default excerpt: the first [`EXCERPT_CHARS`] characters of the
/// tag-stripped content followed by an ellipsis.
pub fn derive_excerpt(content: &str) -> String {
    let plain = strip_tags(content);
    let mut excerpt: String = plain.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str(EXCERPT_ELLIPSIS);
    excerpt
}

/// Keep an explicit excerpt when one was supplied, otherwise derive it.
pub fn resolve_excerpt(explicit: Option<&str>, content: &str) -> String {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => derive_excerpt(content),
    }
}

/// Count whitespace-separated words in the tag-stripped content.
pub fn word_count(content: &str) -> usize {
    strip_tags(content).split_whitespace().count()
}

/// Estimated reading duration in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReadTime(u32);

impl ReadTime {
    /// Ceiling of `words / 200`, never below one minute.
    pub fn estimate(content: &str) -> Self {
        let words = word_count(content);
        let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
        Self(u32::try_from(minutes).unwrap_or(u32::MAX))
    }

    pub fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min read", self.0)
    }
}

/// Shorthand for [`ReadTime::estimate`] returning the minute count.
pub fn read_time_minutes(content: &str) -> u32 {
    ReadTime::estimate(content).minutes()
}
