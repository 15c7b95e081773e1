pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod recognition;
pub mod record;
pub mod sanitize;
pub mod service;
pub mod storage;
pub mod worker;

pub use config::{load_config, load_config_from_str, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, IntakeError, PlatelogError, Result, StorageError, WorkerError};
pub use logging::init_logging;
pub use pipeline::{
    BroadcastEvents, EnrichmentError, Enricher, EventSink, IntakeEvent, IntakePipeline, NoopEvents,
};
pub use recognition::{RecognitionClient, RecognitionError, Recognizer};
pub use record::{
    EnrichmentUpdate, IntakeRecord, IntakeStatus, NewIntake, Nutrient, RecordStore,
    SqliteRecordStore, StatusView, UpdateOutcome,
};
pub use service::IntakeService;
pub use storage::{FileImageStore, ImageStore};
pub use worker::{EnrichmentJob, JobOutcome, JobQueue, JobResult, WorkerPool};
