//! Log sanitization for credentials and patient identifiers.
//!
//! The HTTP adapter logs request paths, and backend error bodies can end up in
//! warnings. Before a formatted line reaches the log sink it is scrubbed of:
//! - CSRF and session cookie values
//! - `X-CSRFToken` header values and password fields
//! - Patient codes in URL paths and `patient_id` query parameters
//! - E-mail addresses
//!
//! # Performance / DoS
//!
//! `sanitize()` caps the scanned input (see `MEDPREDICT_SANITIZE_MAX_BYTES`);
//! anything past the cap is replaced by a `[TRUNCATED]` marker.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

/// Defaults to 16 KiB; overridable via `MEDPREDICT_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

/// (pattern, replacement). Replacements may use capture groups.
const RULES: &[(&str, &str)] = &[
    // Cookies, either as `Cookie:` pairs or `Set-Cookie` values
    (
        r"(?i)\b(csrftoken|sessionid)=[A-Za-z0-9._\-]+",
        "${1}=[REDACTED-TOKEN]",
    ),
    (r"(?i)\b(x-csrftoken)\s*[:=]\s*[A-Za-z0-9._\-]+", "${1}: [REDACTED-TOKEN]"),
    // JSON or form password fields
    (
        r#"(?i)"?(password|confirm_password)"?\s*[:=]\s*"[^"]*""#,
        r#""${1}": "[REDACTED]""#,
    ),
    // Patient codes in paths and queries
    (r"/api/patients/[^/\s?]+", "/api/patients/[REDACTED-PATIENT]"),
    (r"\bpatient_id=[^&\s]+", "patient_id=[REDACTED-PATIENT]"),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
];

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn compile() -> Option<Patterns> {
    let set = RegexSet::new(RULES.iter().map(|(p, _)| *p)).ok()?;
    let rules = RULES
        .iter()
        .map(|&(pattern, replacement)| {
            Regex::new(pattern).ok().map(|regex| Rule { regex, replacement })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Patterns { set, rules })
}

fn patterns() -> Option<&'static Patterns> {
    PATTERNS.get_or_init(compile).as_ref()
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("MEDPREDICT_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Replace credentials and patient identifiers in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = match patterns() {
        Some(patterns) => {
            let mut out = prefix.to_string();
            for idx in patterns.set.matches(prefix).into_iter() {
                let rule = &patterns.rules[idx];
                out = rule.regex.replace_all(&out, rule.replacement).into_owned();
            }
            out
        }
        // Patterns are constants; failing to compile them must not leak raw lines.
        None => "[REDACTED-UNSANITIZED]".to_string(),
    };

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check whether `input` carries anything `sanitize` would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().map_or(true, |patterns| patterns.set.is_match(prefix))
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        if text.len() <= max_sanitize_bytes() && !contains_sensitive(&text) {
            return self.inner.write_all(text.as_bytes());
        }
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter writing one huge line without newlines must not buffer forever.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_cookies() {
        let sanitized = sanitize("Cookie: sessionid=abc123def; csrftoken=XyZ987");
        assert!(!sanitized.contains("abc123def"));
        assert!(!sanitized.contains("XyZ987"));
        assert!(sanitized.contains("sessionid=[REDACTED-TOKEN]"));
        assert!(sanitized.contains("csrftoken=[REDACTED-TOKEN]"));
    }

    #[test]
    fn test_sanitize_csrf_header() {
        let sanitized = sanitize("X-CSRFToken: Zm9vYmFy");
        assert!(!sanitized.contains("Zm9vYmFy"));
    }

    #[test]
    fn test_sanitize_patient_codes() {
        let sanitized = sanitize("GET /api/patients/4711/ -> 404 Not Found");
        assert_eq!(sanitized, "GET /api/patients/[REDACTED-PATIENT]/ -> 404 Not Found");

        let sanitized = sanitize("GET /api/predictions/?patient_id=P-12&x=1");
        assert!(sanitized.contains("patient_id=[REDACTED-PATIENT]&x=1"));
    }

    #[test]
    fn test_sanitize_password_and_email() {
        let sanitized = sanitize(r#"{"email": "ann@clinic.org", "password": "s3cret pass"}"#);
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("s3cret"));
    }

    #[test]
    fn test_contains_sensitive() {
        assert!(contains_sensitive("POST /api/patients/12/"));
        assert!(!contains_sensitive("POST /api/predict/heart/ -> 200"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("GET /api/patients/123456789/", 16);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut out);
            writer.write_all(b"verify /api/pat").expect("write");
            writer.write_all(b"ients/99/ ok\nplain line\n").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "verify /api/patients/[REDACTED-PATIENT]/ ok\nplain line\n");
    }
}
