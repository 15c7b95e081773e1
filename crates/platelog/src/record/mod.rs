pub mod model;
pub mod store;

pub use model::{EnrichmentUpdate, IntakeRecord, IntakeStatus, NewIntake, Nutrient, StatusView};
pub use store::{RecordStore, SqliteRecordStore, UpdateOutcome};
