//! Timestamp utilities
//!
//! Stored timestamps are RFC 3339 UTC strings with millisecond precision
//! (`2024-05-01T10:15:30.123Z`). The fixed width means lexical order and
//! chronological order agree, which the review store and sync watermark rely on.

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp in the stored representation
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in the stored representation
pub fn now_timestamp() -> String {
    format_timestamp(now())
}

/// Return `candidate` unless `previous` is later, so a row's timestamp never moves backwards
pub fn not_before(previous: Option<&str>, candidate: String) -> String {
    match previous {
        Some(prev) if prev > candidate.as_str() => prev.to_string(),
        _ => candidate,
    }
}
