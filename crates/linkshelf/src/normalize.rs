//! Conversion of a cleaned document into compact markdown text.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::ConversionError;
use crate::sanitize::truncate_chars;

static RE_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Converts the document body to markdown and collapses blank lines.
///
/// Deterministic for a given document. Fails if the converter cannot walk
/// the markup or the result has no text left.
pub fn to_text(document: &Html) -> Result<String, ConversionError> {
    let html = match Selector::parse("body") {
        Ok(sel) => document
            .select(&sel)
            .next()
            .map(|body| body.inner_html())
            .unwrap_or_else(|| document.html()),
        Err(_) => document.html(),
    };

    let markdown = panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(&html)))
        .map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "converter panicked".to_string());
            ConversionError::Converter(reason)
        })?;

    let text = collapse_newlines(&markdown);
    if text.is_empty() {
        return Err(ConversionError::EmptyDocument);
    }
    Ok(text)
}

/// Strips trailing whitespace from each line, collapses runs of three or
/// more newlines to two, and trims the result. Idempotent.
pub fn collapse_newlines(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    RE_BLANK_RUN
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// Head of `text` limited to `max_chars` characters.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    truncate_chars(text, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text_simple_body() {
        let doc = Html::parse_document("<title>Foo</title><body>hello</body>");
        assert_eq!(to_text(&doc).unwrap(), "hello");
    }

    #[test]
    fn test_to_text_keeps_structure() {
        let doc = Html::parse_document(
            "<body><h2>Intro</h2><p>First paragraph.</p><p>Second paragraph.</p></body>",
        );
        let text = to_text(&doc).unwrap();
        assert!(text.contains("Intro"));
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
        assert!(!text.contains("\n\n\n"));
    }

    #[test]
    fn test_to_text_is_deterministic() {
        let html = "<body><ul><li>a</li><li>b</li></ul><p>text</p></body>";
        let first = to_text(&Html::parse_document(html)).unwrap();
        let second = to_text(&Html::parse_document(html)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_text_empty_document() {
        let doc = Html::parse_document("<body>   </body>");
        assert!(matches!(to_text(&doc), Err(ConversionError::EmptyDocument)));
    }

    #[test]
    fn test_collapse_newlines() {
        assert_eq!(collapse_newlines("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_newlines("a\n\nb"), "a\n\nb");
        assert_eq!(collapse_newlines("a  \n \n\t\n\nb"), "a\n\nb");
        assert_eq!(collapse_newlines("\n\n  text  \n\n"), "text");
    }

    #[test]
    fn test_collapse_newlines_is_idempotent() {
        let inputs = [
            "a\n\n\n\n\nb\n\n\nc",
            "  leading\n\n\n   \n\ntrailing   \n",
            "no newlines",
            "\r\n\r\n\r\n\r\nwindows",
            "",
        ];
        for input in inputs {
            let once = collapse_newlines(input);
            assert_eq!(collapse_newlines(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_excerpt_truncates_by_chars() {
        let text = "é".repeat(50_000);
        let head = excerpt(&text, 10_000);
        assert_eq!(head.chars().count(), 10_000);
        assert_eq!(excerpt("short", 10_000), "short");
    }
}
