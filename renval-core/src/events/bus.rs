//! Publishing seam between the services and whoever listens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::AssessmentEvent;

/// Position of an event in publish order; the first event is 1
pub type EventSeq = u64;

/// An event as delivered to subscribers and kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub seq: EventSeq,
    pub at: DateTime<Utc>,
    pub event: AssessmentEvent,
}

/// Which retained events a reader wants back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only events published after this sequence number
    pub after: Option<EventSeq>,
    pub assessment_id: Option<String>,
}

impl EventFilter {
    pub fn assessment(id: impl Into<String>) -> Self {
        Self {
            assessment_id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        self.after.is_none_or(|after| envelope.seq > after)
            && self
                .assessment_id
                .as_deref()
                .is_none_or(|id| envelope.event.assessment_id() == id)
    }
}

/// Fan-out of [`AssessmentEvent`]s with a bounded history.
///
/// Publishing never fails. Readers that fall behind the retained window
/// see only what is still held.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Stamp and deliver an event, returning its sequence number
    async fn publish(&self, event: AssessmentEvent) -> EventSeq;

    /// Live events published from now on
    fn subscribe(&self) -> broadcast::Receiver<EventEnvelope>;

    /// Retained events matching `filter`, oldest first
    async fn history(&self, filter: &EventFilter) -> Vec<EventEnvelope>;

    /// Sequence number of the latest event, 0 before the first
    fn current_seq(&self) -> EventSeq;
}
