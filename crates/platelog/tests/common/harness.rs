//! Isolated pipeline environment for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use platelog::pipeline::{BroadcastEvents, Enricher, IntakePipeline};
use platelog::recognition::Recognizer;
use platelog::record::{IntakeStatus, SqliteRecordStore, StatusView};
use platelog::storage::FileImageStore;
use platelog::worker::{JobQueue, WorkerPool};
use platelog::Database;

/// How long `wait_for_terminal` polls before giving up.
const TERMINAL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub images: Arc<FileImageStore>,
    pub records: Arc<SqliteRecordStore>,
    pub events: BroadcastEvents,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads").join("food_images");
        let db = Database::open_in_memory().expect("Failed to open in-memory database");

        Self {
            images: Arc::new(FileImageStore::new(&upload_dir)),
            records: Arc::new(SqliteRecordStore::new(db)),
            events: BroadcastEvents::new(256),
            upload_dir,
            temp_dir,
        }
    }

    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    pub fn enricher(&self, recognizer: Arc<dyn Recognizer>) -> Arc<Enricher> {
        Arc::new(Enricher::new(
            self.images.clone(),
            self.records.clone(),
            recognizer,
            Arc::new(self.events.clone()),
        ))
    }

    pub fn pipeline(&self, queue: JobQueue) -> IntakePipeline {
        IntakePipeline::new(
            self.images.clone(),
            self.records.clone(),
            queue,
            Arc::new(self.events.clone()),
        )
    }

    /// Starts a worker pool over this harness and a pipeline feeding it.
    pub fn start(
        &self,
        recognizer: Arc<dyn Recognizer>,
        workers: usize,
    ) -> (IntakePipeline, WorkerPool) {
        let pool = WorkerPool::start(self.enricher(recognizer), workers);
        let pipeline = self.pipeline(pool.queue());
        (pipeline, pool)
    }
}

/// Polls `get_status` until the record leaves `pending`.
pub async fn wait_for_terminal(pipeline: &IntakePipeline, id: &str) -> StatusView {
    let deadline = tokio::time::Instant::now() + TERMINAL_TIMEOUT;
    loop {
        let view = pipeline.get_status(id).expect("record should exist");
        if view.status() != IntakeStatus::Pending {
            return view;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("record {} still pending after {:?}", id, TERMINAL_TIMEOUT);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
