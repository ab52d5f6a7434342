use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn};

use crate::ai::{self, ContentProcessor};
use crate::config::Config;
use crate::db::BookmarkStore;
use crate::fetch::{ContentFetcher, HttpFetcher, Page};
use crate::model::{AiStatus, Tag};
use crate::normalize;
use crate::sanitize::{self, truncate_chars};
use crate::worker::job::{EnrichmentJob, JobOutcome, SkipReason};

use super::config::PipelineConfig;
use super::context::EnrichmentContext;
use super::error::EnrichError;
use super::progress::{EnrichmentPhase, ProgressEvent, ProgressReporter};

/// Description written when enrichment fails.
pub const FALLBACK_DESCRIPTION: &str = "AI processing failed. Could not generate summary.";

/// Runs enrichment jobs: fetch, clean, summarize, tag, persist.
pub struct Enricher {
    config: Arc<PipelineConfig>,
    store: Arc<dyn BookmarkStore>,
    fetcher: Arc<dyn ContentFetcher>,
    processor: ContentProcessor,
}

impl Enricher {
    /// Production constructor: HTTP fetcher and configured language model.
    pub fn from_config(config: &Config, store: Arc<dyn BookmarkStore>) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        let client = ai::client_from_config(&config.ai)?;
        let pipeline_config = Arc::new(PipelineConfig::from_config(config));
        let processor = ContentProcessor::new(client, pipeline_config.tag_count);

        Ok(Self::new(pipeline_config, store, Arc::new(fetcher), processor))
    }

    pub fn new(
        config: Arc<PipelineConfig>,
        store: Arc<dyn BookmarkStore>,
        fetcher: Arc<dyn ContentFetcher>,
        processor: ContentProcessor,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            processor,
        }
    }

    /// Runs one job to a terminal outcome. Never panics on step failures:
    /// they are recorded on the bookmark as `failed`.
    pub fn run(&self, job: &EnrichmentJob, progress: &dyn ProgressReporter) -> JobOutcome {
        let _enrichment_span = info_span!("enrichment",
            bookmark_id = job.bookmark_id,
            user_id = job.user_id,
            trace_id = %job.trace_id,
        )
        .entered();

        let bookmark = match self.store.get(job.bookmark_id) {
            Ok(Some(bookmark)) => bookmark,
            Ok(None) => {
                warn!("Bookmark {} no longer exists, skipping", job.bookmark_id);
                return self.skip(job, SkipReason::NotFound, progress);
            }
            Err(e) => {
                error!("Failed to load bookmark {}: {}", job.bookmark_id, e);
                return self.abort(job, e.to_string(), progress);
            }
        };

        if !bookmark.ai_enabled {
            debug!("AI enrichment disabled for bookmark {}", bookmark.id);
            return self.skip(job, SkipReason::AiDisabled, progress);
        }

        if bookmark.user_id != job.user_id {
            warn!(
                "Job user {} does not own bookmark {} (owner {})",
                job.user_id, bookmark.id, bookmark.user_id
            );
        }

        let claim_token = match self.store.claim_for_processing(bookmark.id) {
            Ok(Some(token)) => token,
            Ok(None) => {
                let status = self
                    .store
                    .get(bookmark.id)
                    .ok()
                    .flatten()
                    .map(|b| b.ai_status)
                    .unwrap_or(bookmark.ai_status);
                info!("Bookmark {} is already {}, skipping", bookmark.id, status);
                return self.skip(job, SkipReason::AlreadyFinished(status), progress);
            }
            Err(e) => {
                error!("Failed to claim bookmark {}: {}", bookmark.id, e);
                return self.abort(job, e.to_string(), progress);
            }
        };

        info!(
            "Enriching bookmark {} ({})",
            bookmark.id,
            sanitize::redact_url(&bookmark.url)
        );

        let mut ctx = EnrichmentContext::new(job.clone(), bookmark, claim_token);

        match self.enrich(&mut ctx, progress) {
            Ok(()) => self.commit_success(&ctx, progress),
            Err(e) => self.commit_failure(&ctx, &e, progress),
        }
    }

    fn enrich(
        &self,
        ctx: &mut EnrichmentContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), EnrichError> {
        // Step 1: Fetch
        let html = {
            let _step = info_span!("fetch").entered();
            progress.report(ProgressEvent::Phase {
                phase: EnrichmentPhase::Fetching,
                message: "Fetching page...".to_string(),
            });
            self.step_fetch(ctx)?
        };

        // Step 2+3: Strip boilerplate, extract title, normalize
        let text = {
            let _step = info_span!("normalize").entered();
            progress.report(ProgressEvent::Phase {
                phase: EnrichmentPhase::Normalizing,
                message: "Extracting page text...".to_string(),
            });
            self.step_normalize(ctx, &html)?
        };

        // Step 4: Excerpt
        let excerpt = self.step_excerpt(ctx, &text);

        // Step 5: Summarize
        {
            let _step = info_span!("summarize").entered();
            progress.report(ProgressEvent::Phase {
                phase: EnrichmentPhase::Summarizing,
                message: "Generating summary...".to_string(),
            });
            ctx.summary = Some(self.processor.summarize(&excerpt)?);
        }

        // Step 6+7: Generate and resolve tags
        {
            let _step = info_span!("tag").entered();
            progress.report(ProgressEvent::Phase {
                phase: EnrichmentPhase::Tagging,
                message: "Generating tags...".to_string(),
            });
            let names = self.processor.generate_tags(&excerpt)?;
            ctx.tags = self.step_resolve_tags(&names)?;
        }

        Ok(())
    }

    fn step_fetch(&self, ctx: &EnrichmentContext) -> Result<String, EnrichError> {
        let html = self.fetcher.fetch(&ctx.original.url)?;
        debug!("Fetched {} bytes of HTML", html.len());
        Ok(html)
    }

    fn step_normalize(
        &self,
        ctx: &mut EnrichmentContext,
        html: &str,
    ) -> Result<String, EnrichError> {
        let page = Page::parse(html);
        let text = normalize::to_text(&page.document)?;

        ctx.title = Some(page.title);
        ctx.text_chars = text.chars().count();
        Ok(text)
    }

    fn step_excerpt(&self, ctx: &EnrichmentContext, text: &str) -> String {
        let excerpt = normalize::excerpt(text, self.config.excerpt_chars);
        if excerpt.len() < text.len() {
            debug!(
                "Truncated normalized text from {} to {} characters",
                ctx.text_chars, self.config.excerpt_chars
            );
        }
        excerpt.to_string()
    }

    fn step_resolve_tags(&self, names: &[String]) -> Result<Vec<Tag>, EnrichError> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            let tag = self.store.get_or_create_tag(name)?;
            if !tags.iter().any(|t| t.id == tag.id) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    fn commit_success(
        &self,
        ctx: &EnrichmentContext,
        progress: &dyn ProgressReporter,
    ) -> JobOutcome {
        let _step = info_span!("save").entered();
        progress.report(ProgressEvent::Phase {
            phase: EnrichmentPhase::Saving,
            message: "Saving results...".to_string(),
        });

        let mut bookmark = ctx.original.clone();
        bookmark.title = ctx
            .title
            .clone()
            .unwrap_or_else(|| ctx.original.title.clone());
        bookmark.description = ctx.summary.clone().unwrap_or_default();
        bookmark.ai_status = AiStatus::Completed;
        bookmark.ai_error = None;

        match self.store.save(&bookmark, &ctx.tags, &ctx.claim_token) {
            Ok(true) => {}
            Ok(false) => return self.superseded(ctx, progress),
            Err(e) => {
                error!("Failed to save enrichment of bookmark {}: {}", bookmark.id, e);
                return self.commit_failure(ctx, &EnrichError::Storage(e), progress);
            }
        }

        let tag_names: Vec<String> = ctx.tags.iter().map(|t| t.name.clone()).collect();
        info!(
            "Bookmark {} enriched with {} tags",
            bookmark.id,
            tag_names.len()
        );
        progress.report(ProgressEvent::Completed {
            title: bookmark.title,
            tags: tag_names,
        });

        JobOutcome::completed(&ctx.job)
    }

    fn commit_failure(
        &self,
        ctx: &EnrichmentContext,
        err: &EnrichError,
        progress: &dyn ProgressReporter,
    ) -> JobOutcome {
        let message = truncate_chars(&err.to_string(), self.config.error_max_chars).to_string();
        warn!("Enrichment of bookmark {} failed: {}", ctx.original.id, message);

        let mut bookmark = ctx.original.clone();
        bookmark.description = FALLBACK_DESCRIPTION.to_string();
        bookmark.ai_status = AiStatus::Failed;
        bookmark.ai_error = Some(message.clone());

        match self
            .store
            .save(&bookmark, &ctx.original.tags, &ctx.claim_token)
        {
            Ok(true) => {}
            Ok(false) => return self.superseded(ctx, progress),
            Err(e) => {
                error!(
                    "Failed to record failure of bookmark {}: {}",
                    bookmark.id, e
                );
                return self.abort(&ctx.job, e.to_string(), progress);
            }
        }

        progress.report(ProgressEvent::Failed {
            error: message.clone(),
        });
        JobOutcome::failed(&ctx.job, message)
    }

    /// The claim was taken over by another delivery, or that delivery already
    /// finished the record. Its result stands.
    fn superseded(&self, ctx: &EnrichmentContext, progress: &dyn ProgressReporter) -> JobOutcome {
        warn!(
            "Bookmark {} was claimed by another run, discarding this result",
            ctx.original.id
        );
        self.skip(&ctx.job, SkipReason::Superseded, progress)
    }

    fn skip(
        &self,
        job: &EnrichmentJob,
        reason: SkipReason,
        progress: &dyn ProgressReporter,
    ) -> JobOutcome {
        progress.report(ProgressEvent::Skipped {
            reason: reason.to_string(),
        });
        JobOutcome::skipped(job, reason)
    }

    fn abort(
        &self,
        job: &EnrichmentJob,
        error: String,
        progress: &dyn ProgressReporter,
    ) -> JobOutcome {
        progress.report(ProgressEvent::Failed {
            error: error.clone(),
        });
        JobOutcome::aborted(job, error)
    }
}
