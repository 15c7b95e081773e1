//! Record store boundary and its SQLite implementation.

use chrono::{SubsecRound, Utc};

use crate::db::intake_repo::{self, IntakeRow, TerminalWrite, Transition};
use crate::db::{Database, DatabaseError};
use crate::storage::image_url;

use super::model::{EnrichmentUpdate, IntakeRecord, IntakeStatus, NewIntake, Nutrient};

/// Result of a field-scoped terminal update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The record moved out of `pending`; carries the record as written.
    Updated(IntakeRecord),
    /// The record was already terminal and was left untouched.
    NotPending(IntakeRecord),
    NotFound,
}

/// Document store for intake records.
///
/// There is no whole-record overwrite: the only mutation is
/// [`RecordStore::update_partial`], which writes the enrichment fields and
/// status of a pending record and nothing else.
pub trait RecordStore: Send + Sync {
    /// Persists a new pending record and returns it with its assigned id.
    fn insert(&self, new: NewIntake) -> Result<IntakeRecord, DatabaseError>;

    fn get_by_id(&self, id: &str) -> Result<Option<IntakeRecord>, DatabaseError>;

    fn update_partial(
        &self,
        id: &str,
        update: &EnrichmentUpdate,
    ) -> Result<UpdateOutcome, DatabaseError>;

    /// An owner's records, newest first.
    fn list_by_owner(&self, owner: &str) -> Result<Vec<IntakeRecord>, DatabaseError>;

    /// Records still waiting for enrichment, oldest first.
    fn list_pending(&self) -> Result<Vec<IntakeRecord>, DatabaseError>;
}

pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn fetch(&self, id: &str) -> Result<IntakeRecord, DatabaseError> {
        intake_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| DatabaseError::Corrupt {
                id: id.to_string(),
                reason: "row vanished during update".to_string(),
            })
            .and_then(row_to_record)
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, new: NewIntake) -> Result<IntakeRecord, DatabaseError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().trunc_subsecs(6);
        let record = new.into_pending(id, now);

        intake_repo::insert(&self.db, &record_to_row(&record)?)?;
        Ok(record)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<IntakeRecord>, DatabaseError> {
        intake_repo::find_by_id(&self.db, id)?
            .map(row_to_record)
            .transpose()
    }

    fn update_partial(
        &self,
        id: &str,
        update: &EnrichmentUpdate,
    ) -> Result<UpdateOutcome, DatabaseError> {
        let transition = match update {
            EnrichmentUpdate::Complete {
                food_name,
                nutrients,
                ingredients,
            } => {
                let nutrients_json = to_json(id, nutrients)?;
                let ingredients_json = to_json(id, ingredients)?;
                intake_repo::transition_from_pending(
                    &self.db,
                    id,
                    TerminalWrite::Complete {
                        food_name,
                        nutrients_json: &nutrients_json,
                        ingredients_json: &ingredients_json,
                    },
                    Utc::now(),
                )?
            }
            EnrichmentUpdate::Failed => intake_repo::transition_from_pending(
                &self.db,
                id,
                TerminalWrite::Failed,
                Utc::now(),
            )?,
        };

        match transition {
            Transition::Applied { .. } => Ok(UpdateOutcome::Updated(self.fetch(id)?)),
            Transition::NotPending { .. } => Ok(UpdateOutcome::NotPending(self.fetch(id)?)),
            Transition::Missing => Ok(UpdateOutcome::NotFound),
        }
    }

    fn list_by_owner(&self, owner: &str) -> Result<Vec<IntakeRecord>, DatabaseError> {
        intake_repo::list_by_owner(&self.db, owner)?
            .into_iter()
            .map(row_to_record)
            .collect()
    }

    fn list_pending(&self) -> Result<Vec<IntakeRecord>, DatabaseError> {
        intake_repo::list_by_status(&self.db, IntakeStatus::Pending.as_str())?
            .into_iter()
            .map(row_to_record)
            .collect()
    }
}

fn to_json<T: serde::Serialize>(id: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Corrupt {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn record_to_row(record: &IntakeRecord) -> Result<IntakeRow, DatabaseError> {
    Ok(IntakeRow {
        id: record.id.clone(),
        owner: record.owner.clone(),
        image_ref: record.image_ref.clone(),
        food_name: record.food_name.clone(),
        nutrients: to_json(&record.id, &record.nutrients)?,
        ingredients: to_json(&record.id, &record.ingredients)?,
        status: record.status.as_str().to_string(),
        created_at: intake_repo::format_timestamp(record.created_at),
        updated_at: intake_repo::format_timestamp(record.updated_at),
    })
}

fn row_to_record(row: IntakeRow) -> Result<IntakeRecord, DatabaseError> {
    let corrupt = |reason: String| DatabaseError::Corrupt {
        id: row.id.clone(),
        reason,
    };

    let status = IntakeStatus::parse(&row.status)
        .ok_or_else(|| corrupt(format!("unknown status '{}'", row.status)))?;
    let nutrients: Vec<Nutrient> = serde_json::from_str(&row.nutrients)
        .map_err(|e| corrupt(format!("nutrients: {}", e)))?;
    let ingredients: Vec<String> = serde_json::from_str(&row.ingredients)
        .map_err(|e| corrupt(format!("ingredients: {}", e)))?;
    let created_at = intake_repo::parse_timestamp(&row.created_at)
        .ok_or_else(|| corrupt(format!("created_at '{}'", row.created_at)))?;
    let updated_at = intake_repo::parse_timestamp(&row.updated_at)
        .ok_or_else(|| corrupt(format!("updated_at '{}'", row.updated_at)))?;

    Ok(IntakeRecord {
        image_url: image_url(&row.image_ref),
        id: row.id,
        owner: row.owner,
        image_ref: row.image_ref,
        food_name: row.food_name,
        nutrients,
        ingredients,
        status,
        created_at,
        updated_at,
    })
}
