//! Tag validation
//!
//! Tags end up as filter values, so they are held to a strict allow-list.
//! The injection block-list is defense in depth only: the content store never
//! builds query text from tags.

use thiserror::Error;

use super::normalize_text;

/// Maximum tag length in characters, after normalization.
pub const MAX_TAG_LENGTH: usize = 50;

/// Substrings that are never accepted in a tag, matched case-insensitively.
const BLOCKED_PATTERNS: &[&str] = &[
    "'", "\"", ";", "--", "/*", "*/", "xp_", "sp_", "exec", "union", "select",
];

/// Reasons a tag is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("tag must not be empty")]
    Empty,

    #[error("tag must not be empty after normalization")]
    EmptyAfterNormalization,

    #[error("tag contains invalid characters")]
    BlockedPattern,

    #[error("tag can only contain letters, numbers, hyphens and underscores")]
    InvalidCharacters,

    #[error("tag must be at most {MAX_TAG_LENGTH} characters")]
    TooLong,
}

/// Validate a raw tag and return its canonical (lower-cased) form.
pub fn validate_tag(raw: &str) -> Result<String, TagError> {
    if raw.is_empty() {
        return Err(TagError::Empty);
    }

    let normalized = normalize_text(raw);
    if normalized.is_empty() {
        return Err(TagError::EmptyAfterNormalization);
    }

    let lowered = normalized.to_lowercase();
    if BLOCKED_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return Err(TagError::BlockedPattern);
    }

    if !lowered
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TagError::InvalidCharacters);
    }

    if lowered.chars().count() > MAX_TAG_LENGTH {
        return Err(TagError::TooLong);
    }

    Ok(lowered)
}

/// Canonicalize a tag list, keeping the first occurrence of each tag.
///
/// Entries that fail validation are dropped; callers validate the list first.
pub fn dedupe_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        if let Ok(canonical) = validate_tag(tag.as_ref()) {
            if !unique.contains(&canonical) {
                unique.push(canonical);
            }
        }
    }
    unique
}
