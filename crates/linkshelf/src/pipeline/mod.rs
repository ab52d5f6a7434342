pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod runner;

pub use config::PipelineConfig;
pub use context::EnrichmentContext;
pub use error::EnrichError;
pub use progress::{
    BroadcastProgress, EnrichmentEvent, EnrichmentPhase, NoopProgress, ProgressEvent,
    ProgressReporter,
};
pub use runner::{Enricher, FALLBACK_DESCRIPTION};
