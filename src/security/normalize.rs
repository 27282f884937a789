//! Free-text normalization

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Every `C*` code point (control, format, private use, unassigned) except the
/// whitespace controls we keep.
static NON_PRINTABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{C}--[\n\r\t]]").expect("static pattern"));

/// Normalize user-supplied text to NFC, strip non-printable code points and
/// trim surrounding whitespace.
///
/// Never fails. An input made only of whitespace or control characters
/// normalizes to an empty string, which callers must reject themselves.
pub fn normalize_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let composed: String = input.nfc().collect();
    NON_PRINTABLE.replace_all(&composed, "").trim().to_string()
}
