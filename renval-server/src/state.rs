//! Shared application state for the renval server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use renval_core::collaborators::{JsonDocumentRenderer, MemoryArtifactStore, RecordingDispatcher};
use renval_core::{Collaborators, CoreConfig, MemoryEventBus, Renval, Store};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    pub renval: Renval,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(renval: Renval) -> Self {
        Self {
            renval,
            started_at: Utc::now(),
        }
    }

    /// State backed by an in-memory database and in-memory collaborators
    pub fn in_memory() -> renval_core::Result<Self> {
        let store = Arc::new(Store::open_in_memory()?);
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let renval = Renval::new(
            store,
            Collaborators {
                artifacts: artifacts.clone(),
                renderer: Arc::new(JsonDocumentRenderer::new(artifacts)),
                dispatcher: Arc::new(RecordingDispatcher::new()),
                events: Arc::new(MemoryEventBus::default()),
            },
            CoreConfig::default(),
        );
        Ok(Self::new(renval))
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_in_memory() {
        let state = AppState::in_memory().unwrap();
        assert!(state.uptime_seconds() >= 0);
        assert!(state.renval.store().list_people().unwrap().is_empty());
    }
}
