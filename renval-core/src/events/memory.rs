//! Process-local event bus

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast};

use super::AssessmentEvent;
use super::bus::{EventBus, EventEnvelope, EventFilter, EventSeq};

/// Default number of events kept for late readers
pub const DEFAULT_RETAINED_EVENTS: usize = 1024;

struct History {
    last_seq: EventSeq,
    retained: VecDeque<EventEnvelope>,
}

/// [`EventBus`] that keeps the newest `retain` events in memory and
/// broadcasts each one to live subscribers
pub struct MemoryEventBus {
    retain: usize,
    history: Mutex<History>,
    // Sent under the history lock so live order matches sequence order
    tx: broadcast::Sender<EventEnvelope>,
    latest: AtomicU64,
}

impl MemoryEventBus {
    pub fn new(retain: usize) -> Self {
        let retain = retain.max(1);
        let (tx, _) = broadcast::channel(retain);
        Self {
            retain,
            history: Mutex::new(History {
                last_seq: 0,
                retained: VecDeque::with_capacity(retain.min(DEFAULT_RETAINED_EVENTS)),
            }),
            tx,
            latest: AtomicU64::new(0),
        }
    }

    pub fn retain(&self) -> usize {
        self.retain
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_RETAINED_EVENTS)
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: AssessmentEvent) -> EventSeq {
        let mut history = self.history.lock().await;
        history.last_seq += 1;
        let envelope = EventEnvelope {
            seq: history.last_seq,
            at: Utc::now(),
            event,
        };
        if history.retained.len() == self.retain {
            history.retained.pop_front();
        }
        history.retained.push_back(envelope.clone());
        self.latest.store(envelope.seq, Ordering::Release);
        // No receivers is fine
        let _ = self.tx.send(envelope);
        history.last_seq
    }

    fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    async fn history(&self, filter: &EventFilter) -> Vec<EventEnvelope> {
        let history = self.history.lock().await;
        history
            .retained
            .iter()
            .filter(|envelope| filter.matches(envelope))
            .cloned()
            .collect()
    }

    fn current_seq(&self) -> EventSeq {
        self.latest.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(id: &str) -> AssessmentEvent {
        AssessmentEvent::Deleted {
            assessment_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn sequence_starts_at_one() {
        let bus = MemoryEventBus::new(16);
        assert_eq!(bus.current_seq(), 0);
        assert_eq!(bus.publish(deleted("a1")).await, 1);
        assert_eq!(bus.publish(deleted("a2")).await, 2);
        assert_eq!(bus.current_seq(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_stamped_events() {
        let bus = MemoryEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(deleted("a1")).await;

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.seq, 1);
        assert_eq!(envelope.event, deleted("a1"));
    }

    #[tokio::test]
    async fn history_drops_the_oldest_past_the_cap() {
        let bus = MemoryEventBus::new(3);
        for id in ["a1", "a2", "a1", "a2", "a1"] {
            bus.publish(deleted(id)).await;
        }

        let all: Vec<_> = bus
            .history(&EventFilter::default())
            .await
            .into_iter()
            .map(|e| e.seq)
            .collect();
        assert_eq!(all, vec![3, 4, 5]);
        assert_eq!(bus.current_seq(), 5);
    }

    #[tokio::test]
    async fn history_filters_by_position_and_assessment() {
        let bus = MemoryEventBus::new(16);
        for id in ["a1", "a2", "a1", "a2"] {
            bus.publish(deleted(id)).await;
        }

        let mut filter = EventFilter::assessment("a1");
        let seqs: Vec<_> = bus.history(&filter).await.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 3]);

        filter.after = Some(1);
        let seqs: Vec<_> = bus.history(&filter).await.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![3]);

        let after = EventFilter {
            after: Some(4),
            ..Default::default()
        };
        assert!(bus.history(&after).await.is_empty());
    }

    #[test]
    fn zero_retention_still_keeps_the_latest() {
        assert_eq!(MemoryEventBus::new(0).retain(), 1);
    }
}
