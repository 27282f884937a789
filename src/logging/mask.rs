//! Redaction rules for log text

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement for secret values and sensitive fields.
pub const MASK: &str = "***MASKED***";

/// Replacement for JWT-shaped tokens.
pub const JWT_PLACEHOLDER: &str = "JWT_TOKEN_MASKED";

/// Field names whose values are never logged, whatever they contain.
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "secret",
    "token",
    "jwt",
    "access_token",
    "refresh_token",
    "api_key",
    "authorization",
    "username",
    "email",
    "pepper",
];

/// Opaque generated identifiers that are safe to log verbatim.
const PASSTHROUGH_KEYS: &[&str] = &["correlation_id"];

static JWT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\beyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*").expect("static pattern")
});

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b([A-Za-z0-9_-]*(?:password|passwd|pwd|secret|token|key))(["']?\s*[:=]\s*)("[^"]*"|'[^']*'|[^\s&,;]+)"#,
    )
    .expect("static pattern")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z0-9._%+-]{1,3})[A-Za-z0-9._%+-]*@([A-Za-z0-9.-]+\.[A-Za-z]{2,})\b")
        .expect("static pattern")
});

static LONG_NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})\d{5,}(\d{2})\b").expect("static pattern"));

/// Redact PII-shaped substrings from free text.
///
/// JWTs go first so the generic `key=value` rule never sees half a token.
pub fn mask_pii(text: &str) -> String {
    let masked = JWT_PATTERN.replace_all(text, JWT_PLACEHOLDER);
    let masked = SECRET_PATTERN.replace_all(&masked, format!("${{1}}${{2}}{MASK}").as_str());
    let masked = EMAIL_PATTERN.replace_all(&masked, "${1}***@${2}");
    let masked = LONG_NUMBER_PATTERN.replace_all(&masked, "${1}***${2}");
    masked.into_owned()
}

/// Mask a structured field value by its name, then by its content.
pub fn mask_field<'a>(name: &str, value: &'a str) -> Cow<'a, str> {
    if SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(name)) {
        return Cow::Borrowed(MASK);
    }
    if PASSTHROUGH_KEYS.contains(&name) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(mask_pii(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JWT: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                       eyJzdWIiOiIxMjM0NTY3ODkwIn0.\
                       dozjgN6z7hm7N8Bm7f8Y9vX8Y9vX8Y9vX8Y9vX8Y9vX";

    #[test]
    fn test_password_value_is_masked() {
        let masked = mask_pii(r#"password: "secret123""#);
        assert!(!masked.contains("secret123"));
        assert_eq!(masked, format!("password: {MASK}"));
    }

    #[test]
    fn test_secret_variants() {
        let masked = mask_pii("api_key=abc123 pwd=p4ss&next=1 Secret : 'quoted value'");
        assert!(!masked.contains("abc123"));
        assert!(!masked.contains("p4ss"));
        assert!(!masked.contains("quoted value"));
        assert!(masked.contains("&next=1"));

        let json = mask_pii(r#"{"password": "hunter2", "user": "bob"}"#);
        assert!(!json.contains("hunter2"));
        assert!(json.contains(r#""user": "bob""#));
    }

    #[test]
    fn test_jwt_is_masked() {
        let masked = mask_pii(&format!("Token: {JWT}"));
        assert!(!masked.contains(JWT));
        assert!(!masked.contains("eyJzdWIiOiIxMjM0NTY3ODkwIn0"));
        assert!(masked.contains(JWT_PLACEHOLDER) || masked.contains(MASK));

        let bare = mask_pii(&format!("issued {JWT} to client"));
        assert_eq!(bare, format!("issued {JWT_PLACEHOLDER} to client"));
    }

    #[test]
    fn test_email_local_part_is_masked() {
        let masked = mask_pii("Contact user@example.com for details");
        assert!(!masked.contains("user@example.com"));
        assert_eq!(masked, "Contact use***@example.com for details");

        assert_eq!(mask_pii("a@b.io"), "a***@b.io");
    }

    #[test]
    fn test_long_numbers_are_masked() {
        assert_eq!(mask_pii("call 79161234567 now"), "call 791***67 now");
        assert_eq!(mask_pii("card 1234567890"), "card 123***90");
        // Short numbers are left alone
        assert_eq!(mask_pii("post 123456789"), "post 123456789");
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let text = "Post created with status draft";
        assert_eq!(mask_pii(text), text);
    }

    #[test]
    fn test_sensitive_field_names_are_masked_wholesale() {
        for key in ["password", "Username", "access_token", "JWT", "refresh_token"] {
            assert_eq!(mask_field(key, "anything at all"), MASK, "{key}");
        }
    }

    #[test]
    fn test_other_fields_fall_back_to_pattern_masking() {
        assert_eq!(mask_field("owner", "bob@example.com"), "bob***@example.com");
        assert_eq!(mask_field("path", "/posts/1"), "/posts/1");
    }

    #[test]
    fn test_correlation_id_passes_through() {
        let cid = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(mask_field("correlation_id", cid), cid);
    }
}
