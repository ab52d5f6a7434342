pub mod job;
pub mod pool;
pub mod recovery;

pub use job::{EnrichmentJob, JobOutcome, JobQueue, OutcomeKind, SkipReason};
pub use pool::WorkerPool;
pub use recovery::recover_interrupted;
