pub mod error;
pub mod progress;
pub mod runner;

pub use error::EnrichmentError;
pub use progress::{BroadcastEvents, EventSink, IntakeEvent, NoopEvents};
pub use runner::{Enricher, IntakePipeline};
