//! Utilities for generating deterministic, URL-safe slugs from display names.
//!
//! A slug is the lowercase form of the name where every maximal run of
//! characters outside `a-z0-9` becomes a single hyphen and leading/trailing
//! hyphens are dropped. Letters outside ASCII count as separators; they are
//! not transliterated.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid separator pattern"));

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("`{input}` has no letters or digits to build a slug from")]
    Unrepresentable { input: String },
}

/// Derive a slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let lowered = input.to_lowercase();
    let candidate = SEPARATOR_RUN.replace_all(&lowered, "-");
    let candidate = candidate.trim_matches('-');

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate.to_string())
}
