//! Common utilities and helper functions

pub mod retry;

/// Truncate text to at most `max_chars` characters, appending `...` when cut
///
/// Used to keep error strings from unreachable hosts bounded in logs and the
/// status page.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Round a latency in milliseconds to two decimals for display
pub fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
