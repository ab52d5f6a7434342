//! Helpers for sanitizing data before it enters logs, span attributes or
//! persisted error messages.

use reqwest::Url;

/// Strips userinfo, query string and fragment from a URL.
///
/// - `https://user:pw@example.com/a?token=x#top` → `https://example.com/a`
/// - unparseable input → `<invalid-url>`
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            // Cannot fail for URLs with a host, which are the only ones that can carry userinfo.
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => "<invalid-url>".to_string(),
    }
}

/// Truncates to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
