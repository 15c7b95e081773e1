use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use crate::error::{IntakeError, WorkerError};
use crate::pipeline::Enricher;
use crate::record::RecordStore;
use crate::worker::job::{EnrichmentJob, JobOutcome};

/// Sending side of the enrichment queue.
///
/// Cheap to clone; the pipeline holds one to schedule work on submit.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<EnrichmentJob>,
    shutdown: Arc<AtomicBool>,
}

impl JobQueue {
    pub fn enqueue(&self, job: EnrichmentJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed) || self.sender.is_closed()
    }
}

/// Fixed set of tokio tasks pulling enrichment jobs from a shared queue.
pub struct WorkerPool {
    queue: JobQueue,
    workers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0 or if called outside a Tokio runtime.
    pub fn start(enricher: Arc<Enricher>, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = mpsc::unbounded_channel::<EnrichmentJob>();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let job_receiver = Arc::new(Mutex::new(job_receiver));

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&job_receiver),
                    shutdown_rx.clone(),
                    Arc::clone(&enricher),
                ))
            })
            .collect();

        info!("Started {} enrichment workers", worker_count);

        Self {
            queue: JobQueue {
                sender: job_sender,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
            workers,
            shutdown_tx,
        }
    }

    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    /// Queues every record still `pending`.
    ///
    /// Intended for startup, before any new submission is accepted; a record
    /// queued twice is still written at most once.
    pub fn recover_pending(&self, store: &dyn RecordStore) -> Result<usize, IntakeError> {
        let pending = store.list_pending()?;
        let count = pending.len();

        for record in &pending {
            self.queue.enqueue(EnrichmentJob::for_record(record))?;
        }

        if count > 0 {
            info!("Re-queued {} pending intake records", count);
        }
        Ok(count)
    }

    /// Stops workers from taking new jobs. Jobs already taken run to completion.
    pub fn shutdown(&self) {
        info!("Shutting down enrichment workers...");
        self.queue.shutdown.store(true, Ordering::Relaxed);
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All enrichment workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.queue.shutdown.load(Ordering::Relaxed)
    }
}

async fn run_worker(
    worker_id: usize,
    job_receiver: Arc<Mutex<mpsc::UnboundedReceiver<EnrichmentJob>>>,
    mut shutdown: watch::Receiver<bool>,
    enricher: Arc<Enricher>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if *shutdown.borrow() {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        let next = tokio::select! {
            biased;
            _ = shutdown.changed() => None,
            job = async { job_receiver.lock().await.recv().await } => job,
        };

        let Some(job) = next else {
            break;
        };

        debug!("Worker {} enriching record {}", worker_id, job.record_id);
        let result = enricher.run(&job).await;
        match &result.outcome {
            JobOutcome::Aborted { reason } => {
                warn!(
                    "Worker {} left record {} pending: {}",
                    worker_id, result.record_id, reason
                );
            }
            outcome => debug!(
                "Worker {} finished record {}: {:?}",
                worker_id, result.record_id, outcome
            ),
        }
    }

    debug!("Worker {} stopped", worker_id);
}
