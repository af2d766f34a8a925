//! Lifecycle events published after each committed mutation

mod bus;
mod memory;
mod types;

pub use bus::{EventBus, EventEnvelope, EventFilter, EventSeq};
pub use memory::{DEFAULT_RETAINED_EVENTS, MemoryEventBus};
pub use types::AssessmentEvent;
