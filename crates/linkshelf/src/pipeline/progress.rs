use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::AiStatus;
use crate::worker::job::EnrichmentJob;

/// Phase of an enrichment run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentPhase {
    Queued,
    Fetching,
    Normalizing,
    Summarizing,
    Tagging,
    Saving,
    Completed,
    Failed,
    Skipped,
}

impl std::fmt::Display for EnrichmentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentPhase::Queued => write!(f, "Queued"),
            EnrichmentPhase::Fetching => write!(f, "Fetching"),
            EnrichmentPhase::Normalizing => write!(f, "Normalizing"),
            EnrichmentPhase::Summarizing => write!(f, "Summarizing"),
            EnrichmentPhase::Tagging => write!(f, "Tagging"),
            EnrichmentPhase::Saving => write!(f, "Saving"),
            EnrichmentPhase::Completed => write!(f, "Completed"),
            EnrichmentPhase::Failed => write!(f, "Failed"),
            EnrichmentPhase::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Events emitted by the enricher during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Phase {
        phase: EnrichmentPhase,
        message: String,
    },
    Completed {
        title: String,
        tags: Vec<String>,
    },
    Failed {
        error: String,
    },
    Skipped {
        reason: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests and one-shot runs.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress event as published to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentEvent {
    pub bookmark_id: i64,
    pub trace_id: String,
    pub phase: EnrichmentPhase,
    /// Record status implied by this event.
    pub status: AiStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Publishes events of one job on a tokio broadcast channel.
/// Events are dropped when nobody is subscribed.
pub struct BroadcastProgress {
    bookmark_id: i64,
    trace_id: String,
    sender: Arc<broadcast::Sender<EnrichmentEvent>>,
}

impl BroadcastProgress {
    pub fn new(job: &EnrichmentJob, sender: Arc<broadcast::Sender<EnrichmentEvent>>) -> Self {
        Self {
            bookmark_id: job.bookmark_id,
            trace_id: job.trace_id.clone(),
            sender,
        }
    }

    fn event(&self, phase: EnrichmentPhase, status: AiStatus, message: String) -> EnrichmentEvent {
        EnrichmentEvent {
            bookmark_id: self.bookmark_id,
            trace_id: self.trace_id.clone(),
            phase,
            status,
            message,
            timestamp: Utc::now(),
            title: None,
            tags: Vec::new(),
            error: None,
        }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ProgressEvent) {
        let event = match event {
            ProgressEvent::Phase { phase, message } => {
                let status = if phase == EnrichmentPhase::Queued {
                    AiStatus::Pending
                } else {
                    AiStatus::Processing
                };
                self.event(phase, status, message)
            }
            ProgressEvent::Completed { title, tags } => EnrichmentEvent {
                title: Some(title),
                tags,
                ..self.event(
                    EnrichmentPhase::Completed,
                    AiStatus::Completed,
                    "Enrichment completed".to_string(),
                )
            },
            ProgressEvent::Failed { error } => EnrichmentEvent {
                error: Some(error),
                ..self.event(
                    EnrichmentPhase::Failed,
                    AiStatus::Failed,
                    "Enrichment failed".to_string(),
                )
            },
            ProgressEvent::Skipped { reason } => {
                self.event(EnrichmentPhase::Skipped, AiStatus::Skipped, reason)
            }
        };

        // No receivers is not an error
        let _ = self.sender.send(event);
    }
}
