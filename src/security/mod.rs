//! Input sanitation guards
//!
//! Unicode normalization for free text and the allow-list validator for tags.

mod normalize;
mod tags;

pub use normalize::normalize_text;
pub use tags::{dedupe_tags, validate_tag, TagError, MAX_TAG_LENGTH};
