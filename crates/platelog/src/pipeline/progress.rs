use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::record::IntakeStatus;

/// Lifecycle events emitted while intake records move through the pipeline.
///
/// Failure reasons travel here and in logs only; they are never stored on
/// the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeEvent {
    Queued {
        record_id: String,
        owner: String,
    },
    Started {
        record_id: String,
    },
    Completed {
        record_id: String,
        food_name: String,
    },
    Failed {
        record_id: String,
        reason: String,
    },
    Skipped {
        record_id: String,
        status: IntakeStatus,
    },
}

impl IntakeEvent {
    pub fn record_id(&self) -> &str {
        match self {
            IntakeEvent::Queued { record_id, .. }
            | IntakeEvent::Started { record_id }
            | IntakeEvent::Completed { record_id, .. }
            | IntakeEvent::Failed { record_id, .. }
            | IntakeEvent::Skipped { record_id, .. } => record_id,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn report(&self, event: IntakeEvent);
}

/// Sink that drops every event.
pub struct NoopEvents;

impl EventSink for NoopEvents {
    fn report(&self, _event: IntakeEvent) {}
}

/// Fans events out to any number of subscribers over a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastEvents {
    sender: Arc<broadcast::Sender<IntakeEvent>>,
}

impl BroadcastEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IntakeEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEvents {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventSink for BroadcastEvents {
    fn report(&self, event: IntakeEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}
