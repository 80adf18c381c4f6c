//! URL helpers for url reminders.

use std::sync::OnceLock;

use regex::Regex;

/// Prefix `https://` unless the input already carries an http(s) scheme.
///
/// Surrounding whitespace is trimmed. Empty input stays empty.
pub fn normalize_url(input: &str) -> String {
    let url = input.trim();
    if url.is_empty() {
        return String::new();
    }
    if http_scheme().is_match(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Heuristic: a single whitespace-free token containing a dot.
pub fn is_likely_url(input: &str) -> bool {
    let s = input.trim();
    if s.is_empty() || s.chars().any(char::is_whitespace) || !s.contains('.') {
        return false;
    }
    static LIKELY: OnceLock<Regex> = OnceLock::new();
    let likely = LIKELY
        .get_or_init(|| Regex::new(r"(?i)^(https?://)?\S+\.\S+$").expect("Invalid URL regex"));
    likely.is_match(s)
}

/// Only `http://` and `https://` urls are ever opened. Schemes compare
/// case-insensitively.
pub fn is_openable(url: &str) -> bool {
    http_scheme().is_match(url)
}

fn http_scheme() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"(?i)^https?://").expect("Invalid scheme regex"))
}
