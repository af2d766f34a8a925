//! Assessment lifecycle state machine
//!
//! [`transitions`] holds the transition table and the command set,
//! `machine` is the only code that writes assessment status, and
//! [`AssessmentService`] exposes the lifecycle operations.

mod machine;
mod service;
pub mod transitions;

pub(crate) use machine::apply;
pub use machine::StatusChange;
pub use service::AssessmentService;
pub use transitions::{
    Command, EvaluationProgress, Guard, Override, TransitionCause, allowed_targets,
};
