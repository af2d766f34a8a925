//! Server-sent stream of assessment events
//!
//! A client first receives the retained events after `since`, then live
//! events as they are published. Reconnecting with the last seen `seq`
//! resumes without gaps as long as the bus still retains it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use renval_core::{EventBus, EventEnvelope, EventFilter, EventSeq};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use super::Params;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    /// Last sequence number the client has seen
    pub since: Option<EventSeq>,
    pub assessment_id: Option<String>,
}

fn to_sse(envelope: &EventEnvelope) -> Event {
    let event = Event::default()
        .id(envelope.seq.to_string())
        .event(envelope.event.kind());
    match serde_json::to_string(envelope) {
        Ok(json) => event.data(json),
        Err(e) => {
            warn!(seq = envelope.seq, error = %e, "Failed to encode event");
            event.comment("unencodable event")
        }
    }
}

/// `GET /api/events`
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Params(params): Params<StreamParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let bus = state.renval.events();
    // Subscribe before reading history so nothing published in between is lost
    let live = BroadcastStream::new(bus.subscribe());
    let filter = EventFilter {
        after: params.since,
        assessment_id: params.assessment_id,
    };
    let backlog = bus.history(&filter).await;
    let replayed = backlog
        .last()
        .map(|envelope| envelope.seq)
        .or(filter.after)
        .unwrap_or(0);

    let live = live.filter_map(move |received| match received {
        Ok(envelope) if envelope.seq > replayed && filter.matches(&envelope) => Some(envelope),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "Event stream client lagged");
            None
        }
    });

    let events = tokio_stream::iter(backlog)
        .chain(live)
        .map(|envelope| Ok::<_, Infallible>(to_sse(&envelope)));
    Sse::new(events).keep_alive(KeepAlive::default())
}
