use crate::record::{IntakeRecord, IntakeStatus};

/// One enrichment attempt for one intake record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub record_id: String,
    pub owner: String,
    pub image_ref: String,
}

impl EnrichmentJob {
    pub fn for_record(record: &IntakeRecord) -> Self {
        Self {
            record_id: record.id.clone(),
            owner: record.owner.clone(),
            image_ref: record.image_ref.clone(),
        }
    }
}

/// How an enrichment attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Record written as `complete`.
    Completed,
    /// Record written as `failed`.
    Failed { reason: String },
    /// Record was already terminal; nothing was written.
    Skipped { status: IntakeStatus },
    /// Record no longer exists.
    Missing,
    /// A local store error prevented the terminal write; the record is still pending.
    Aborted { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub record_id: String,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn new(job: &EnrichmentJob, outcome: JobOutcome) -> Self {
        Self {
            record_id: job.record_id.clone(),
            outcome,
        }
    }

    /// Whether this attempt wrote a terminal status.
    pub fn wrote_terminal(&self) -> bool {
        matches!(
            self.outcome,
            JobOutcome::Completed | JobOutcome::Failed { .. }
        )
    }
}
