//! Domain types shared by the store, the services and the HTTP boundary

mod assessment;
mod evaluation;
mod file;
mod person;
mod status;

pub use assessment::{
    Answers, ArtifactRef, Assessment, AssessmentDetail, AssessmentPatch, AssessmentQuery,
    AssessmentTemplate, BatchCreated, EvaluationView, NewAssessmentBatch, NewParticipant, Page,
    PageMetadata, ParticipantLink, ParticipantView, ScheduleConflict, ScheduledParticipant,
    Submission, expiry_for,
};
pub(crate) use evaluation::validate_scores;
pub use evaluation::{
    Actor, Evaluation, EvaluationPatch, EvaluationQuery, EvaluationUpdate, Grade, NewEvaluation,
    Rating, Scores,
};
pub use file::{AssessmentFile, StoredFile, Upload};
pub use person::{NewPerson, Person, PersonSummary};
pub use status::{
    AssessmentStatus, DeliveryMethod, EvaluationStatus, ParticipantRole, SystemRole,
};
