//! PII-safe logging
//!
//! Every log line emitted by the server goes through [`MaskingFields`], which
//! redacts sensitive fields and PII-shaped text before anything reaches the
//! writer.

mod fields;
mod mask;

pub use fields::MaskingFields;
pub use mask::{mask_field, mask_pii, JWT_PLACEHOLDER, MASK, SENSITIVE_KEYS};

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when it is set.
pub fn init(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .fmt_fields(MaskingFields)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
