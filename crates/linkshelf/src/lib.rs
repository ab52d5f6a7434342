//! Bookmark storage with an asynchronous enrichment pipeline that fetches each
//! page, summarizes it and tags it through an OpenAI-compatible model.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod service;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use ai::{AiServiceError, CompletionClient, ContentProcessor, OpenAiClient, RetryingClient};
pub use config::{load_config, Config};
pub use db::{BookmarkStore, Database, DatabaseError};
pub use error::{ConfigError, ConversionError, FetchError, LinkshelfError, Result, WorkerError};
pub use fetch::{ContentFetcher, HttpFetcher, Page};
pub use model::{AiStatus, Bookmark, NewBookmark, Tag};
pub use pipeline::{
    BroadcastProgress, EnrichError, Enricher, EnrichmentEvent, EnrichmentPhase, NoopProgress,
    PipelineConfig, ProgressEvent, ProgressReporter, FALLBACK_DESCRIPTION,
};
pub use secrets::{resolve_secret, SecretError};
pub use service::BookmarkService;
pub use worker::{
    recover_interrupted, EnrichmentJob, JobOutcome, JobQueue, OutcomeKind, SkipReason, WorkerPool,
};
