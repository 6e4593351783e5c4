//! Small text helpers shared by the progression summary and the renderers.

use chrono::Duration;

use crate::wire::Timestamp;

/// Soft-cap `s` at `max` characters, appending `...` when cut.
///
/// Counts `char`s, never splits a code point, and trims trailing whitespace
/// before the ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let cut: String = s.chars().take(keep).collect();
    format!("{}...", cut.trim_end())
}

/// Coarse "time ago" label: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn relative_time(then: Timestamp, now: Timestamp) -> String {
    let diff = now.signed_duration_since(then);
    if diff < Duration::minutes(1) {
        "just now".to_string()
    } else if diff < Duration::hours(1) {
        format!("{}m ago", diff.num_minutes())
    } else if diff < Duration::days(1) {
        format!("{}h ago", diff.num_hours())
    } else {
        format!("{}d ago", diff.num_days())
    }
}

/// `12345` → `12,345`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
