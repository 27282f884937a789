//! `tracing` field formatter that masks before writing

use std::fmt;

use tracing::field::{Field, Visit};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::FormatFields;

use super::mask::mask_field;

/// Field formatter for `tracing_subscriber::fmt` that runs every event and
/// span field through [`mask_field`].
///
/// The event message is masked by content; named fields are masked by name
/// first, so `password = %anything` never prints its value.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaskingFields;

impl<'writer> FormatFields<'writer> for MaskingFields {
    fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = MaskingVisitor {
            writer,
            is_empty: true,
            result: Ok(()),
        };
        fields.record(&mut visitor);
        visitor.result
    }
}

struct MaskingVisitor<'writer> {
    writer: Writer<'writer>,
    is_empty: bool,
    result: fmt::Result,
}

impl MaskingVisitor<'_> {
    fn write_field(&mut self, name: &str, value: &str, quote: bool) {
        if self.result.is_err() {
            return;
        }

        let name = name.strip_prefix("r#").unwrap_or(name);
        let masked = mask_field(name, value);
        let separator = if self.is_empty { "" } else { " " };

        self.result = if name == "message" {
            write!(self.writer, "{separator}{masked}")
        } else if quote {
            write!(self.writer, "{separator}{name}={masked:?}")
        } else {
            write!(self.writer, "{separator}{name}={masked}")
        };
        self.is_empty = false;
    }
}

impl Visit for MaskingVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.write_field(field.name(), value, true);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        self.write_field(field.name(), &rendered, false);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::logging::MASK;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs(emit: impl FnOnce()) -> String {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .fmt_fields(MaskingFields)
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        capture.contents()
    }

    #[test]
    fn test_sensitive_fields_are_masked_by_name() {
        let logs = capture_logs(|| {
            tracing::info!(username = "bob", password = %"hunter2", "Successful login");
        });
        assert!(logs.contains("Successful login"));
        assert!(!logs.contains("bob"));
        assert!(!logs.contains("hunter2"));
        assert!(logs.contains(&format!("username=\"{MASK}\"")));
    }

    #[test]
    fn test_message_and_free_fields_are_masked_by_content() {
        let logs = capture_logs(|| {
            tracing::warn!(
                detail = "reach me at alice@example.com",
                "Lookup for password=letmein"
            );
        });
        assert!(!logs.contains("letmein"));
        assert!(!logs.contains("alice@example.com"));
        assert!(logs.contains("ali***@example.com"));
    }

    #[test]
    fn test_span_fields_are_masked() {
        let logs = capture_logs(|| {
            let span = tracing::info_span!("request", token = "abc.def.ghi", path = "/posts");
            let _guard = span.enter();
            tracing::info!("inside span");
        });
        assert!(!logs.contains("abc.def.ghi"));
        assert!(logs.contains("path=\"/posts\""));
    }

    #[test]
    fn test_numeric_fields_are_rendered() {
        let logs = capture_logs(|| {
            tracing::info!(post_id = 42, status = 404_u16, "Post lookup");
        });
        assert!(logs.contains("post_id=42"));
        assert!(logs.contains("status=404"));
    }
}
