//! Wires the stores, recognition client and worker pool into a running service.

use std::sync::Arc;

use log::info;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::db::{default_database_path, Database};
use crate::error::{ConfigError, Result};
use crate::pipeline::{BroadcastEvents, Enricher, IntakeEvent, IntakePipeline};
use crate::recognition::{RecognitionClient, Recognizer};
use crate::record::{RecordStore, SqliteRecordStore};
use crate::sanitize;
use crate::storage::{FileImageStore, ImageStore};
use crate::worker::WorkerPool;

/// A started intake service: pipeline in front, worker pool behind.
pub struct IntakeService {
    pipeline: IntakePipeline,
    pool: WorkerPool,
    events: BroadcastEvents,
}

impl IntakeService {
    /// Opens the database, starts the workers and re-queues records left
    /// pending by a previous run. Must be called within a Tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let recognizer = Arc::new(RecognitionClient::new(&config.recognition)?);
        Self::start_with_recognizer(config, recognizer)
    }

    /// Like [`IntakeService::start`], with a caller-supplied recognizer.
    pub fn start_with_recognizer(config: &Config, recognizer: Arc<dyn Recognizer>) -> Result<Self> {
        let db_path = match &config.storage.database_path {
            Some(path) => path.clone(),
            None => default_database_path().ok_or_else(|| ConfigError::Validation {
                message: "no databasePath configured and no home directory found".to_string(),
            })?,
        };
        let records: Arc<dyn RecordStore> =
            Arc::new(SqliteRecordStore::new(Database::open(&db_path)?));
        let images: Arc<dyn ImageStore> =
            Arc::new(FileImageStore::new(&config.storage.upload_directory));
        let events = BroadcastEvents::default();

        let enricher = Arc::new(Enricher::new(
            Arc::clone(&images),
            Arc::clone(&records),
            recognizer,
            Arc::new(events.clone()),
        ));
        let pool = WorkerPool::start(enricher, config.workers.count);
        pool.recover_pending(records.as_ref())?;

        let pipeline = IntakePipeline::new(images, records, pool.queue(), Arc::new(events.clone()));

        info!(
            "Intake service started (endpoint {}, uploads in {})",
            sanitize::redact_endpoint(&config.recognition.endpoint),
            config.storage.upload_directory.display()
        );

        Ok(Self {
            pipeline,
            pool,
            events,
        })
    }

    pub fn pipeline(&self) -> &IntakePipeline {
        &self.pipeline
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IntakeEvent> {
        self.events.subscribe()
    }

    /// Stops taking new jobs and waits for in-flight enrichments to finish.
    pub async fn shutdown(self) {
        self.pool.shutdown();
        self.pool.wait().await;
    }
}
