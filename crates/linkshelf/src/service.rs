//! Bookmark creation and the few record operations around it.

use std::sync::Arc;

use log::{debug, info};
use reqwest::Url;

use crate::db::BookmarkStore;
use crate::error::{LinkshelfError, Result};
use crate::model::{AiStatus, Bookmark, NewBookmark};
use crate::sanitize::redact_url;
use crate::worker::{EnrichmentJob, JobQueue};

pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
    queue: Arc<dyn JobQueue>,
}

impl BookmarkService {
    pub fn new(store: Arc<dyn BookmarkStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Stores a new bookmark and, if AI enrichment is enabled, schedules
    /// exactly one enrichment job. Returns without waiting for the job.
    pub fn create(&self, new: NewBookmark) -> Result<Bookmark> {
        self.create_traced(new, None)
    }

    /// Like [`create`](Self::create), correlating the job with the caller's
    /// `trace_id` when one is given.
    pub fn create_traced(
        &self,
        mut new: NewBookmark,
        trace_id: Option<String>,
    ) -> Result<Bookmark> {
        new.url = new.url.trim().to_string();
        validate_url(&new.url)?;

        let bookmark = self.store.insert(&new, AiStatus::initial(new.ai_enabled))?;
        info!(
            "Created bookmark {} for user {} ({})",
            bookmark.id,
            bookmark.user_id,
            redact_url(&bookmark.url)
        );

        if bookmark.ai_enabled {
            let job = EnrichmentJob::with_trace_id(bookmark.id, bookmark.user_id, trace_id);
            debug!(
                "Enqueuing enrichment for bookmark {} (trace {})",
                bookmark.id, job.trace_id
            );
            self.queue.enqueue(job)?;
        }

        Ok(bookmark)
    }

    pub fn get(&self, id: i64) -> Result<Bookmark> {
        self.store.get(id)?.ok_or(LinkshelfError::NotFound(id))
    }

    pub fn set_favorite(&self, id: i64, favorite: bool) -> Result<Bookmark> {
        if !self.store.set_favorite(id, favorite)? {
            return Err(LinkshelfError::NotFound(id));
        }
        self.get(id)
    }
}

fn validate_url(url: &str) -> Result<()> {
    let invalid = |reason: String| LinkshelfError::InvalidUrl {
        url: redact_url(url),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{}'", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
