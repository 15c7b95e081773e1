pub mod job;
pub mod pool;

pub use job::{EnrichmentJob, JobOutcome, JobResult};
pub use pool::{JobQueue, WorkerPool};
