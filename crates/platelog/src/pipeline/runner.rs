use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{IntakeError, WorkerError};
use crate::recognition::{normalize, Analysis, Recognizer};
use crate::record::{
    EnrichmentUpdate, IntakeRecord, NewIntake, RecordStore, StatusView, UpdateOutcome,
};
use crate::sanitize;
use crate::storage::{image_key, is_recognized_image, ImageStore};
use crate::worker::job::{EnrichmentJob, JobOutcome, JobResult};
use crate::worker::JobQueue;

use super::error::EnrichmentError;
use super::progress::{EventSink, IntakeEvent};

/// Runs one enrichment attempt: image → recognition → normalizer → terminal write.
pub struct Enricher {
    images: Arc<dyn ImageStore>,
    records: Arc<dyn RecordStore>,
    recognizer: Arc<dyn Recognizer>,
    events: Arc<dyn EventSink>,
}

impl Enricher {
    pub fn new(
        images: Arc<dyn ImageStore>,
        records: Arc<dyn RecordStore>,
        recognizer: Arc<dyn Recognizer>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            images,
            records,
            recognizer,
            events,
        }
    }

    /// Never returns an error: every failure is folded into the record's
    /// status or, for local store errors, into [`JobOutcome::Aborted`].
    pub async fn run(&self, job: &EnrichmentJob) -> JobResult {
        let span = info_span!("enrichment",
            record_id = %job.record_id,
            owner = %job.owner,
            image = %sanitize::redact_path(Path::new(&job.image_ref)),
        );
        self.run_job(job).instrument(span).await
    }

    async fn run_job(&self, job: &EnrichmentJob) -> JobResult {
        let records = Arc::clone(&self.records);
        let id = job.record_id.clone();
        let loaded = off_executor(move || records.get_by_id(&id))
            .await
            .and_then(|r| r.map_err(|e| e.to_string()));

        match loaded {
            Ok(Some(record)) if record.status.is_terminal() => {
                debug!(status = %record.status, "Record already terminal, skipping");
                self.events.report(IntakeEvent::Skipped {
                    record_id: job.record_id.clone(),
                    status: record.status,
                });
                return JobResult::new(
                    job,
                    JobOutcome::Skipped {
                        status: record.status,
                    },
                );
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("Record disappeared before enrichment");
                return JobResult::new(job, JobOutcome::Missing);
            }
            Err(reason) => {
                error!(error = %reason, "Failed to load record");
                return JobResult::new(job, JobOutcome::Aborted { reason });
            }
        }

        self.events.report(IntakeEvent::Started {
            record_id: job.record_id.clone(),
        });

        let (update, failure) = match self.analyze(job).await {
            Ok(analysis) => (EnrichmentUpdate::from(analysis), None),
            Err(e) => {
                warn!(error = %e, "Enrichment failed");
                (EnrichmentUpdate::Failed, Some(e.to_string()))
            }
        };

        let store_span = info_span!("store_result", status = %update.status());
        let records = Arc::clone(&self.records);
        let id = job.record_id.clone();
        let outcome = off_executor(move || records.update_partial(&id, &update))
            .instrument(store_span)
            .await
            .and_then(|r| r.map_err(|e| e.to_string()));

        match outcome {
            Ok(UpdateOutcome::Updated(record)) => match failure {
                None => {
                    info!(food_name = %record.food_name, "Record enriched");
                    self.events.report(IntakeEvent::Completed {
                        record_id: record.id,
                        food_name: record.food_name,
                    });
                    JobResult::new(job, JobOutcome::Completed)
                }
                Some(reason) => {
                    self.events.report(IntakeEvent::Failed {
                        record_id: record.id,
                        reason: reason.clone(),
                    });
                    JobResult::new(job, JobOutcome::Failed { reason })
                }
            },
            Ok(UpdateOutcome::NotPending(record)) => {
                debug!(status = %record.status, "Record became terminal during enrichment");
                self.events.report(IntakeEvent::Skipped {
                    record_id: record.id,
                    status: record.status,
                });
                JobResult::new(
                    job,
                    JobOutcome::Skipped {
                        status: record.status,
                    },
                )
            }
            Ok(UpdateOutcome::NotFound) => {
                warn!("Record disappeared during enrichment");
                JobResult::new(job, JobOutcome::Missing)
            }
            Err(reason) => {
                error!(error = %reason, "Failed to write enrichment result");
                JobResult::new(job, JobOutcome::Aborted { reason })
            }
        }
    }

    async fn analyze(&self, job: &EnrichmentJob) -> Result<Analysis, EnrichmentError> {
        let images = Arc::clone(&self.images);
        let key = job.image_ref.clone();
        let image = tokio::task::spawn_blocking(move || images.read(&key))
            .instrument(info_span!("read_image"))
            .await??;

        let raw = self
            .recognizer
            .analyze(image, &job.image_ref)
            .instrument(info_span!("recognize"))
            .await?;

        let _step = info_span!("normalize").entered();
        Ok(normalize(&raw)?)
    }
}

/// Runs blocking store I/O on the Tokio blocking pool.
async fn off_executor<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| format!("blocking task failed: {}", e))
}

/// Client-facing intake operations.
///
/// `submit` returns as soon as the image and the pending record are
/// persisted; enrichment happens on the worker pool behind `queue`.
pub struct IntakePipeline {
    images: Arc<dyn ImageStore>,
    records: Arc<dyn RecordStore>,
    queue: JobQueue,
    events: Arc<dyn EventSink>,
}

impl IntakePipeline {
    pub fn new(
        images: Arc<dyn ImageStore>,
        records: Arc<dyn RecordStore>,
        queue: JobQueue,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            images,
            records,
            queue,
            events,
        }
    }

    pub fn submit(
        &self,
        owner: &str,
        image: &[u8],
        image_name: &str,
    ) -> Result<IntakeRecord, IntakeError> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(IntakeError::Validation("owner must not be empty".to_string()));
        }
        if image.is_empty() {
            return Err(IntakeError::Validation("image must not be empty".to_string()));
        }
        let key = image_key(owner, image_name).ok_or_else(|| {
            IntakeError::Validation(format!("'{}' has no usable file name", image_name))
        })?;
        if !is_recognized_image(&key) {
            debug!(image = %key, "Unrecognized image extension, storing as-is");
        }

        // Nothing is persisted once the workers are gone.
        if self.queue.is_closed() {
            return Err(WorkerError::ChannelClosed.into());
        }

        let image_ref = self.images.save(&key, image)?;
        let record = self.records.insert(NewIntake {
            owner: owner.to_string(),
            image_ref,
        })?;

        self.events.report(IntakeEvent::Queued {
            record_id: record.id.clone(),
            owner: record.owner.clone(),
        });

        // The queue closed after the check: the record is already durable
        // and the next startup recovery schedules it.
        if let Err(e) = self.queue.enqueue(EnrichmentJob::for_record(&record)) {
            warn!(
                record_id = %record.id,
                error = %e,
                "Enrichment queue closed, record left for recovery"
            );
            return Ok(record);
        }

        info!(record_id = %record.id, owner = %record.owner, "Intake submitted");
        Ok(record)
    }

    pub fn get_status(&self, id: &str) -> Result<StatusView, IntakeError> {
        self.records
            .get_by_id(id)?
            .map(StatusView::from_record)
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))
    }

    /// The owner's records, newest first.
    pub fn list_for_owner(&self, owner: &str) -> Result<Vec<IntakeRecord>, IntakeError> {
        Ok(self.records.list_by_owner(owner)?)
    }
}
