//! Summary and tag generation on top of a [`CompletionClient`].

use std::sync::Arc;

use super::prompts::{tags_system_prompt, SUMMARY_SYSTEM_PROMPT};
use super::{AiServiceError, CompletionClient};

/// Runs the two fixed prompts against a page excerpt.
#[derive(Clone)]
pub struct ContentProcessor {
    client: Arc<dyn CompletionClient>,
    tag_count: usize,
}

impl ContentProcessor {
    pub fn new(client: Arc<dyn CompletionClient>, tag_count: usize) -> Self {
        Self { client, tag_count }
    }

    /// Short prose summary of `excerpt`, trimmed.
    pub fn summarize(&self, excerpt: &str) -> Result<String, AiServiceError> {
        let summary = self.client.complete(SUMMARY_SYSTEM_PROMPT, excerpt)?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AiServiceError::EmptyCompletion);
        }
        Ok(summary.to_string())
    }

    /// Normalized tag names for `excerpt`.
    ///
    /// The model is asked for `tag_count` tags; a different number is
    /// logged and accepted.
    pub fn generate_tags(&self, excerpt: &str) -> Result<Vec<String>, AiServiceError> {
        let raw = self
            .client
            .complete(&tags_system_prompt(self.tag_count), excerpt)?;
        let tags = parse_tags(&raw);

        if tags.len() != self.tag_count {
            log::warn!(
                "Expected {} tags from language model, got {}: {:?}",
                self.tag_count,
                tags.len(),
                tags
            );
        }

        Ok(tags)
    }
}

/// Splits a comma-separated reply into normalized, de-duplicated tags.
/// Empty fragments are dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for fragment in raw.split(',') {
        let tag = normalize_tag(fragment);
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Lowercase kebab-case: whitespace and underscores become `-`, other
/// punctuation is dropped, repeated dashes collapse.
pub fn normalize_tag(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    for c in fragment.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if (c == '-' || c == '_' || c.is_whitespace()) && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
