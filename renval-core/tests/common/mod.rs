//! Shared fixtures for renval-core integration tests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use renval_core::collaborators::{
    DocumentRenderer, EvaluationDocument, JsonDocumentRenderer, MemoryArtifactStore,
    QuestionnaireDocument, RecordingDispatcher,
};
use renval_core::model::{
    Actor, ArtifactRef, AssessmentDetail, AssessmentStatus, AssessmentTemplate, DeliveryMethod,
    EvaluationPatch, EvaluationStatus, NewAssessmentBatch, NewPerson, Person, ScheduledParticipant,
    SystemRole, Upload,
};
use renval_core::{
    CollaboratorError, Collaborators, CoreConfig, MemoryEventBus, Renval, Result, Store,
};

/// A core wired to in-memory collaborators that tests can inspect
pub struct Harness {
    pub renval: Renval,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub events: Arc<MemoryEventBus>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::build(RecordingDispatcher::new(), false)
    }

    pub fn with_failing_dispatcher() -> Self {
        Self::build(RecordingDispatcher::failing(), false)
    }

    pub fn with_failing_renderer() -> Self {
        Self::build(RecordingDispatcher::new(), true)
    }

    fn build(dispatcher: RecordingDispatcher, failing_renderer: bool) -> Self {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let dispatcher = Arc::new(dispatcher);
        let events = Arc::new(MemoryEventBus::new(64));
        let renderer: Arc<dyn DocumentRenderer> = if failing_renderer {
            Arc::new(FailingRenderer)
        } else {
            Arc::new(JsonDocumentRenderer::new(artifacts.clone()))
        };

        let renval = Renval::new(
            store,
            Collaborators {
                artifacts: artifacts.clone(),
                renderer,
                dispatcher: dispatcher.clone(),
                events: events.clone(),
            },
            CoreConfig::default(),
        );

        Self {
            renval,
            artifacts,
            dispatcher,
            events,
        }
    }

    /// Insert a person with a phone number
    pub fn person(&self, name: &str, nip: &str) -> Person {
        self.renval
            .store()
            .insert_person(NewPerson {
                name: name.to_string(),
                email: format!("{nip}@example.com"),
                phone: Some("6281234567892".to_string()),
                nip: nip.to_string(),
                position: Some("Technician".to_string()),
                division: Some("Operations".to_string()),
                system_role: SystemRole::User,
            })
            .unwrap()
    }

    pub fn admin(&self) -> Actor {
        Actor::new("admin", SystemRole::Administrator)
    }

    pub async fn batch(
        &self,
        participants: &[(&Person, DateTime<Utc>)],
        evaluators: &[&Person],
    ) -> Result<Vec<AssessmentDetail>> {
        let batch = NewAssessmentBatch {
            assessment: template(),
            participants: participants
                .iter()
                .map(|(person, schedule)| ScheduledParticipant {
                    participant_id: person.id.clone(),
                    schedule: *schedule,
                })
                .collect(),
            evaluators: evaluators.iter().map(|p| p.id.clone()).collect(),
        };
        Ok(self.renval.participants.create_batch(batch).await?.assessments)
    }

    /// One assessment for a fresh participant with two fresh evaluators
    pub async fn single(&self) -> Fixture {
        let participant = self.person("Angga Estibrata", "921722596I");
        let first = self.person("Andi Budimansyah", "881721674I");
        let second = self.person("Rois Syahputra", "961831207I");
        let created = self
            .batch(&[(&participant, schedule())], &[&first, &second])
            .await
            .unwrap();
        Fixture {
            assessment: created.into_iter().next().unwrap(),
            participant,
            evaluators: vec![first, second],
        }
    }

    /// Walk the transition table one request at a time
    pub async fn advance(&self, id: &str, path: &[AssessmentStatus]) -> AssessmentDetail {
        let mut detail = self.renval.assessments.get(id).unwrap();
        for status in path {
            detail = self
                .renval
                .assessments
                .request_transition(id, *status)
                .await
                .unwrap();
        }
        detail
    }

    /// Bring a fresh assessment to `EVALUATING` through the ordinary table
    pub async fn to_evaluating(&self, id: &str) -> AssessmentDetail {
        self.advance(id, &to_ready()).await;
        self.advance(id, &[AssessmentStatus::Evaluating]).await
    }

    /// Mark every evaluation of `id` as completed
    pub async fn complete_all(&self, id: &str) {
        let detail = self.renval.assessments.get(id).unwrap();
        for view in detail.evaluations {
            self.renval
                .evaluations
                .update(
                    &view.evaluation.id,
                    &self.admin(),
                    EvaluationPatch {
                        status: Some(EvaluationStatus::Completed),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
    }
}

#[allow(dead_code)]
pub struct Fixture {
    pub assessment: AssessmentDetail,
    pub participant: Person,
    pub evaluators: Vec<Person>,
}

#[allow(dead_code)]
impl Fixture {
    pub fn id(&self) -> &str {
        &self.assessment.assessment.id
    }
}

/// Renderer standing in for a converter process that always crashes
pub struct FailingRenderer;

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    async fn render_questionnaire(
        &self,
        _document: &QuestionnaireDocument,
    ) -> std::result::Result<ArtifactRef, CollaboratorError> {
        Err(CollaboratorError::Render("converter exited with status 1".into()))
    }

    async fn render_evaluation(
        &self,
        _document: &EvaluationDocument,
    ) -> std::result::Result<ArtifactRef, CollaboratorError> {
        Err(CollaboratorError::Render("converter exited with status 1".into()))
    }
}

pub fn template() -> AssessmentTemplate {
    AssessmentTemplate {
        title: "Fit and Proper Supervisor".to_string(),
        material: "Unit operations and safety".to_string(),
        projection: "SUPERVISOR".to_string(),
        method: DeliveryMethod::Offline,
        room: Some("B-201".to_string()),
        meeting_link: None,
        is_active: true,
    }
}

/// A presentation deck as a participant would upload it
#[allow(dead_code)]
pub fn deck(name: &str) -> Upload {
    Upload::new(name, format!("slides of {name}").into_bytes())
}

/// A memo as an administrator would upload it
#[allow(dead_code)]
pub fn memo(name: &str) -> Upload {
    Upload::new(name, format!("%PDF {name}").into_bytes())
}

pub fn schedule() -> DateTime<Utc> {
    at(2025, 3, 10, 9)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Path from `CREATED` to `READY_FOR_ASSESSMENT`
#[allow(dead_code)]
pub fn to_ready() -> [AssessmentStatus; 4] {
    [
        AssessmentStatus::Scheduled,
        AssessmentStatus::WaitingConfirmation,
        AssessmentStatus::TalentRequirements,
        AssessmentStatus::ReadyForAssessment,
    ]
}
