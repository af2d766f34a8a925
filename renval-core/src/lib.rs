//! renval-core: fit and proper assessment workflow
//!
//! This crate holds the domain logic of renval:
//!
//! - **Lifecycle** - [`AssessmentService`] and the guarded transition table in
//!   [`lifecycle::transitions`]; every status write goes through one state
//!   machine
//! - **Participants** - [`ParticipantCoordinator`] for batch creation,
//!   participant/evaluator links and schedule conflict checks
//! - **Evaluations** - [`EvaluationManager`] for evaluator scoring work
//! - **Submissions** - [`SubmissionTracker`] deriving status from attendance,
//!   presentation and questionnaire
//! - **Persistence** - [`Store`] over SQLite
//! - **Collaborators** - artifact storage, document rendering and
//!   notification traits in [`collaborators`]
//! - **Events** - [`EventBus`] and [`MemoryEventBus`]
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use renval_core::collaborators::{
//!     JsonDocumentRenderer, MemoryArtifactStore, RecordingDispatcher,
//! };
//! use renval_core::model::AssessmentQuery;
//! use renval_core::{Collaborators, CoreConfig, MemoryEventBus, Renval, Store};
//!
//! fn example() -> renval_core::Result<()> {
//!     let store = Arc::new(Store::open_in_memory()?);
//!     let artifacts = Arc::new(MemoryArtifactStore::new());
//!     let renval = Renval::new(
//!         store,
//!         Collaborators {
//!             artifacts: artifacts.clone(),
//!             renderer: Arc::new(JsonDocumentRenderer::new(artifacts)),
//!             dispatcher: Arc::new(RecordingDispatcher::new()),
//!             events: Arc::new(MemoryEventBus::default()),
//!         },
//!         CoreConfig::default(),
//!     );
//!     let page = renval.assessments.list(&AssessmentQuery::new())?;
//!     println!("{} assessments", page.metadata.total);
//!     Ok(())
//! }
//! ```

pub mod collaborators;
mod context;
pub mod error;
mod evaluation;
pub mod events;
pub mod lifecycle;
pub mod model;
mod participants;
pub mod store;
mod submission;

use std::sync::Arc;

pub use context::{Collaborators, CoreConfig, DEFAULT_MAX_EVALUATORS};
pub use error::{CollaboratorError, Error, ErrorKind, Result};
pub use evaluation::EvaluationManager;
pub use events::{AssessmentEvent, EventBus, EventEnvelope, EventFilter, EventSeq, MemoryEventBus};
pub use lifecycle::{AssessmentService, StatusChange, TransitionCause};
pub use participants::ParticipantCoordinator;
pub use store::Store;
pub use submission::{SubmissionTracker, derive_status};

use context::Context;

/// The four core components wired to one store and one set of collaborators
#[derive(Clone)]
pub struct Renval {
    pub assessments: AssessmentService,
    pub participants: ParticipantCoordinator,
    pub evaluations: EvaluationManager,
    pub submissions: SubmissionTracker,
    store: Arc<Store>,
    events: Arc<dyn EventBus>,
}

impl Renval {
    pub fn new(store: Arc<Store>, collaborators: Collaborators, config: CoreConfig) -> Self {
        let events = collaborators.events.clone();
        let ctx = Arc::new(Context::new(store.clone(), collaborators, config));
        Self {
            assessments: AssessmentService::new(ctx.clone()),
            participants: ParticipantCoordinator::new(ctx.clone()),
            evaluations: EvaluationManager::new(ctx.clone()),
            submissions: SubmissionTracker::new(ctx),
            store,
            events,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn events(&self) -> &Arc<dyn EventBus> {
        &self.events
    }
}
