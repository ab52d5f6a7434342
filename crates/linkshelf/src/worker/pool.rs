use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::error::WorkerError;
use crate::pipeline::{
    BroadcastProgress, Enricher, EnrichmentEvent, EnrichmentPhase, NoopProgress, ProgressEvent,
    ProgressReporter,
};
use crate::worker::job::{EnrichmentJob, JobOutcome, JobQueue};

/// Outcomes kept for callers that read them; older ones are dropped when full.
const RESULT_CAPACITY: usize = 1024;

/// Fixed set of threads running enrichment jobs off an in-process queue.
///
/// Submitting never blocks on job execution. Jobs still queued at
/// [`shutdown`](Self::shutdown) stay `pending` in storage and are picked up
/// again by [`recover_interrupted`](super::recover_interrupted).
pub struct WorkerPool {
    job_sender: Sender<EnrichmentJob>,
    result_receiver: Receiver<JobOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(enricher: Arc<Enricher>, worker_count: usize) -> Result<Self, WorkerError> {
        Self::with_progress_sender(enricher, worker_count, None)
    }

    /// Creates a pool whose workers publish progress on `progress_sender`.
    pub fn with_progress_sender(
        enricher: Arc<Enricher>,
        worker_count: usize,
        progress_sender: Option<Arc<broadcast::Sender<EnrichmentEvent>>>,
    ) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be greater than 0".to_string(),
            ));
        }

        let (job_sender, job_receiver) = unbounded::<EnrichmentJob>();
        let (result_sender, result_receiver) = bounded::<JobOutcome>(RESULT_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_enricher = Arc::clone(&enricher);
            let progress = progress_sender.clone();

            let handle = thread::Builder::new()
                .name(format!("enrichment-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(
                        worker_id,
                        job_rx,
                        result_tx,
                        shutdown_flag,
                        worker_enricher,
                        progress,
                    );
                })
                .map_err(|e| {
                    shutdown.store(true, Ordering::Relaxed);
                    WorkerError::SpawnFailed(e.to_string())
                })?;

            workers.push(handle);
        }

        info!("Started {} enrichment workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        })
    }

    pub fn submit(&self, job: EnrichmentJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ShuttingDown);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn recv_result(&self) -> Option<JobOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<JobOutcome> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    /// Jobs submitted but not yet picked up by a worker.
    pub fn queued(&self) -> usize {
        self.job_sender.len()
    }

    /// Asks workers to stop after their current job.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Waits for all workers to exit. Without a prior [`shutdown`](Self::shutdown),
    /// workers first drain the queue.
    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

impl JobQueue for WorkerPool {
    fn enqueue(&self, job: EnrichmentJob) -> Result<(), WorkerError> {
        self.submit(job)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<EnrichmentJob>,
    result_sender: Sender<JobOutcome>,
    shutdown: Arc<AtomicBool>,
    enricher: Arc<Enricher>,
    progress_sender: Option<Arc<broadcast::Sender<EnrichmentEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(job) => {
                debug!(
                    "Worker {} processing bookmark {} (trace {})",
                    worker_id, job.bookmark_id, job.trace_id
                );

                let outcome = if let Some(ref sender) = progress_sender {
                    let progress = BroadcastProgress::new(&job, Arc::clone(sender));
                    progress.report(ProgressEvent::Phase {
                        phase: EnrichmentPhase::Queued,
                        message: "Job picked up by worker".to_string(),
                    });
                    enricher.run(&job, &progress)
                } else {
                    enricher.run(&job, &NoopProgress)
                };

                match result_sender.try_send(outcome) {
                    Ok(()) => {}
                    Err(TrySendError::Full(outcome)) => {
                        warn!(
                            "Result buffer full, dropping outcome for bookmark {}",
                            outcome.bookmark_id
                        );
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("Worker {} result channel disconnected", worker_id);
                        break;
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
