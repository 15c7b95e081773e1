//! Intake record types as seen by pipeline callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::image_url;

/// Lifecycle status of an intake record.
///
/// `Pending` is the only non-terminal state; the pipeline writes exactly one
/// transition out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeStatus {
    Pending,
    Complete,
    Failed,
}

impl IntakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStatus::Pending => "pending",
            IntakeStatus::Complete => "complete",
            IntakeStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(IntakeStatus::Pending),
            "complete" => Some(IntakeStatus::Complete),
            "failed" => Some(IntakeStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntakeStatus::Pending)
    }
}

impl std::fmt::Display for IntakeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

impl Nutrient {
    pub fn new(name: &str, amount: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            amount,
            unit: unit.to_string(),
        }
    }
}

/// One submitted food image and its (eventual) analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRecord {
    pub id: String,
    pub owner: String,
    pub image_ref: String,
    pub image_url: String,
    pub food_name: String,
    pub nutrients: Vec<Nutrient>,
    pub ingredients: Vec<String>,
    pub status: IntakeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the pipeline when a record is created.
#[derive(Debug, Clone)]
pub struct NewIntake {
    pub owner: String,
    pub image_ref: String,
}

impl NewIntake {
    /// Builds the pending record the store persists. `id` is assigned by the store.
    pub fn into_pending(self, id: String, now: DateTime<Utc>) -> IntakeRecord {
        IntakeRecord {
            id,
            image_url: image_url(&self.image_ref),
            owner: self.owner,
            image_ref: self.image_ref,
            food_name: String::new(),
            nutrients: Vec::new(),
            ingredients: Vec::new(),
            status: IntakeStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The single terminal write the enrichment worker performs.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentUpdate {
    Complete {
        food_name: String,
        nutrients: Vec<Nutrient>,
        ingredients: Vec<String>,
    },
    Failed,
}

impl EnrichmentUpdate {
    pub fn status(&self) -> IntakeStatus {
        match self {
            EnrichmentUpdate::Complete { .. } => IntakeStatus::Complete,
            EnrichmentUpdate::Failed => IntakeStatus::Failed,
        }
    }
}

/// What `get_status` returns to pollers.
///
/// Pending records are projected down to id + status so empty enrichment
/// fields are never mistaken for real values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusView {
    Pending { id: String, status: IntakeStatus },
    Ready(IntakeRecord),
}

impl StatusView {
    pub fn from_record(record: IntakeRecord) -> Self {
        if record.status.is_terminal() {
            StatusView::Ready(record)
        } else {
            StatusView::Pending {
                id: record.id,
                status: record.status,
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StatusView::Pending { id, .. } => id,
            StatusView::Ready(record) => &record.id,
        }
    }

    pub fn status(&self) -> IntakeStatus {
        match self {
            StatusView::Pending { status, .. } => *status,
            StatusView::Ready(record) => record.status,
        }
    }

    pub fn record(&self) -> Option<&IntakeRecord> {
        match self {
            StatusView::Pending { .. } => None,
            StatusView::Ready(record) => Some(record),
        }
    }
}
