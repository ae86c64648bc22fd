//! Small string/formatting helpers shared by the server and core crates.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Parse UUID from string, returning `None` on error.
pub fn parse_uuid(s: &str) -> Option<Uuid> {
    Uuid::parse_str(s).ok()
}

/// Format timestamp for API responses (RFC 3339).
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Sanitize a free-form string (e.g. an admin-supplied `Reason`) for storage.
pub fn sanitize_string(s: &str) -> String {
    s.trim().to_string()
}

/// Truncate a string to at most `max_len` bytes, appending `...` when cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_reasons() {
        let s = "a".repeat(20);
        assert_eq!(truncate_string(&s, 10), "aaaaaaa...");
    }

    #[test]
    fn leaves_short_strings_untouched() {
        assert_eq!(truncate_string("short", 10), "short");
    }
}
