use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkerError;
use crate::model::AiStatus;

/// Deferred enrichment of one bookmark.
///
/// Carries identifiers only; the record is re-read from storage when the
/// job runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentJob {
    pub bookmark_id: i64,
    pub user_id: i64,
    /// Correlates log lines and progress events of one run.
    pub trace_id: String,
}

impl EnrichmentJob {
    pub fn new(bookmark_id: i64, user_id: i64) -> Self {
        Self::with_trace_id(bookmark_id, user_id, None)
    }

    /// Uses the caller's trace id, or a fresh one when none (or a blank one)
    /// is given.
    pub fn with_trace_id(bookmark_id: i64, user_id: i64, trace_id: Option<String>) -> Self {
        let trace_id = trace_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            bookmark_id,
            user_id,
            trace_id,
        }
    }
}

/// Why a job finished without touching the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
    AiDisabled,
    AlreadyFinished(AiStatus),
    /// Another delivery claimed the record while this one was running.
    Superseded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "bookmark not found"),
            SkipReason::AiDisabled => write!(f, "AI enrichment disabled"),
            SkipReason::AlreadyFinished(status) => write!(f, "already {}", status),
            SkipReason::Superseded => write!(f, "claimed by another run"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Record persisted as `completed`.
    Completed,
    /// Record persisted as `failed` with this (truncated) error.
    Failed { error: String },
    Skipped(SkipReason),
    /// Storage failed before the run could record anything.
    Aborted { error: String },
}

/// Result of running one [`EnrichmentJob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub bookmark_id: i64,
    pub trace_id: String,
    pub kind: OutcomeKind,
}

impl JobOutcome {
    pub fn completed(job: &EnrichmentJob) -> Self {
        Self::new(job, OutcomeKind::Completed)
    }

    pub fn failed(job: &EnrichmentJob, error: String) -> Self {
        Self::new(job, OutcomeKind::Failed { error })
    }

    pub fn skipped(job: &EnrichmentJob, reason: SkipReason) -> Self {
        Self::new(job, OutcomeKind::Skipped(reason))
    }

    pub fn aborted(job: &EnrichmentJob, error: String) -> Self {
        Self::new(job, OutcomeKind::Aborted { error })
    }

    fn new(job: &EnrichmentJob, kind: OutcomeKind) -> Self {
        Self {
            bookmark_id: job.bookmark_id,
            trace_id: job.trace_id.clone(),
            kind,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.kind, OutcomeKind::Completed)
    }
}

/// Accepts enrichment jobs for deferred execution.
///
/// `enqueue` must return without waiting for the job to run.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: EnrichmentJob) -> Result<(), WorkerError>;
}
