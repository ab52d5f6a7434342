use crate::model::{Bookmark, Tag};
use crate::worker::job::EnrichmentJob;

pub struct EnrichmentContext {
    // Input
    pub job: EnrichmentJob,

    // Record as it was when claimed; the failure path restores title and tags from it
    pub original: Bookmark,

    // Presented on save; a later claim of the same record revokes it
    pub claim_token: String,

    // Page title, set after parsing
    pub title: Option<String>,

    // Normalized text length in characters
    pub text_chars: usize,

    // Model outputs
    pub summary: Option<String>,
    pub tags: Vec<Tag>,
}

impl EnrichmentContext {
    pub fn new(job: EnrichmentJob, original: Bookmark, claim_token: String) -> Self {
        Self {
            job,
            original,
            claim_token,
            title: None,
            text_chars: 0,
            summary: None,
            tags: Vec::new(),
        }
    }
}
