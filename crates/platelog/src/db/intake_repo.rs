//! Intake repository: row-level operations for the `intakes` table.
//!
//! Terminal writes go through [`transition_from_pending`], which only touches
//! the enrichment columns plus `status`/`updated_at` and only while the row is
//! still `pending`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_COMPLETE: &str = "complete";
pub const STATUS_FAILED: &str = "failed";

/// A raw intake row from the database.
#[derive(Debug, Clone)]
pub struct IntakeRow {
    pub id: String,
    pub owner: String,
    pub image_ref: String,
    pub food_name: String,
    /// JSON array of `{name, amount, unit}` objects.
    pub nutrients: String,
    /// JSON array of strings.
    pub ingredients: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl IntakeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner: row.get("owner")?,
            image_ref: row.get("image_ref")?,
            food_name: row.get("food_name")?,
            nutrients: row.get("nutrients")?,
            ingredients: row.get("ingredients")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Terminal write applied to a pending row.
#[derive(Debug, Clone, Copy)]
pub enum TerminalWrite<'a> {
    Complete {
        food_name: &'a str,
        nutrients_json: &'a str,
        ingredients_json: &'a str,
    },
    Failed,
}

/// Outcome of [`transition_from_pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The row moved to a terminal status.
    Applied { updated_at: String },
    /// The row was already terminal; nothing was written.
    NotPending { status: String },
    /// No row with this id.
    Missing,
}

/// Formats a timestamp the way every `*_at` column stores it.
///
/// Fixed-width microsecond RFC 3339 keeps lexical and chronological order the same.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Picks the next `updated_at` so it is strictly later than `previous`,
/// even if the wall clock went backwards.
pub fn next_timestamp(previous: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match parse_timestamp(previous) {
        Some(prev) => {
            let floor = prev + Duration::microseconds(1);
            if now > floor {
                now
            } else {
                floor
            }
        }
        None => {
            log::warn!("next_timestamp: unparseable previous value '{}'", previous);
            now
        }
    }
}

/// Inserts a new intake row.
pub fn insert(db: &Database, row: &IntakeRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO intakes (id, owner, image_ref, food_name, nutrients, ingredients,
             status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                row.id,
                row.owner,
                row.image_ref,
                row.food_name,
                row.nutrients,
                row.ingredients,
                row.status,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds an intake by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<IntakeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM intakes WHERE id = ?1",
                params![id],
                IntakeRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Lists an owner's intakes, newest first.
pub fn list_by_owner(db: &Database, owner: &str) -> Result<Vec<IntakeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM intakes WHERE owner = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![owner], IntakeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists intakes with the given status, oldest first.
pub fn list_by_status(db: &Database, status: &str) -> Result<Vec<IntakeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM intakes WHERE status = ?1 ORDER BY created_at ASC")?;
        let rows = stmt
            .query_map(params![status], IntakeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Moves a pending row to a terminal status.
///
/// Runs under the connection lock: the status check and the conditional
/// update cannot interleave with another writer in this process, and the
/// `status = 'pending'` guard covers writers outside it.
pub fn transition_from_pending(
    db: &Database,
    id: &str,
    write: TerminalWrite<'_>,
    now: DateTime<Utc>,
) -> Result<Transition, DatabaseError> {
    db.with_conn(|conn| {
        let current: Option<(String, String)> = conn
            .query_row(
                "SELECT status, updated_at FROM intakes WHERE id = ?1",
                params![id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let Some((status, previous)) = current else {
            return Ok(Transition::Missing);
        };
        if status != STATUS_PENDING {
            return Ok(Transition::NotPending { status });
        }

        let updated_at = format_timestamp(next_timestamp(&previous, now));
        let changed = match write {
            TerminalWrite::Complete {
                food_name,
                nutrients_json,
                ingredients_json,
            } => conn.execute(
                "UPDATE intakes SET food_name = ?2, nutrients = ?3, ingredients = ?4,
                 status = ?5, updated_at = ?6
                 WHERE id = ?1 AND status = ?7",
                params![
                    id,
                    food_name,
                    nutrients_json,
                    ingredients_json,
                    STATUS_COMPLETE,
                    updated_at,
                    STATUS_PENDING,
                ],
            )?,
            TerminalWrite::Failed => conn.execute(
                "UPDATE intakes SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
                params![id, STATUS_FAILED, updated_at, STATUS_PENDING],
            )?,
        };

        if changed == 0 {
            return Ok(Transition::NotPending { status });
        }
        Ok(Transition::Applied { updated_at })
    })
}
