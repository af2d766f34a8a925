//! Assessment records, inputs and read projections

use std::collections::BTreeMap;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::Evaluation;
use super::file::Upload;
use super::person::PersonSummary;
use super::status::{AssessmentStatus, DeliveryMethod, ParticipantRole};
use crate::error::{Error, Result};

/// Questionnaire answers keyed by question
pub type Answers = BTreeMap<String, serde_json::Value>;

/// Canonical reference to a stored artifact, resolved once when the artifact
/// is written and stored verbatim afterwards
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, used as the stored file name
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records stay valid for two years after their schedule
pub fn expiry_for(schedule: DateTime<Utc>) -> DateTime<Utc> {
    schedule
        .checked_add_months(Months::new(24))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One scheduled competency evaluation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub material: String,
    /// Target grade the participant is projected into
    pub projection: String,
    pub method: DeliveryMethod,
    pub room: Option<String>,
    pub meeting_link: Option<String>,
    /// Test-taker for assessments created in a batch
    pub participant_id: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub expiry: Option<DateTime<Utc>>,
    pub status: AssessmentStatus,
    pub attendance_confirmed: bool,
    pub questionnaire_responses: Option<Answers>,
    pub presentation_file: Option<ArtifactRef>,
    pub questionnaire_file: Option<ArtifactRef>,
    /// Official memo attached by the administrator
    pub nota_dinas_file: Option<ArtifactRef>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    /// Every artifact reference owned directly by the assessment row
    pub fn artifacts(&self) -> Vec<ArtifactRef> {
        [
            &self.presentation_file,
            &self.questionnaire_file,
            &self.nota_dinas_file,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    pub fn has_answers(&self) -> bool {
        self.questionnaire_responses
            .as_ref()
            .is_some_and(|answers| !answers.is_empty())
    }
}

/// Descriptive fields shared by every assessment of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentTemplate {
    pub title: String,
    pub material: String,
    pub projection: String,
    pub method: DeliveryMethod,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl AssessmentTemplate {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("material", &self.material)?;
        require_text("projection", &self.projection)?;
        if let Some(link) = &self.meeting_link {
            validate_link(link)?;
        }
        Ok(())
    }
}

/// A participant with their individual schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledParticipant {
    pub participant_id: String,
    pub schedule: DateTime<Utc>,
}

/// Input for batch creation: one assessment per participant, each evaluated
/// by every listed evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssessmentBatch {
    pub assessment: AssessmentTemplate,
    pub participants: Vec<ScheduledParticipant>,
    pub evaluators: Vec<String>,
}

/// Result of a batch creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreated {
    pub created_count: usize,
    pub assessments: Vec<AssessmentDetail>,
}

/// Partial update of an assessment's descriptive fields; unset fields are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentPatch {
    pub title: Option<String>,
    pub material: Option<String>,
    pub projection: Option<String>,
    pub method: Option<DeliveryMethod>,
    pub room: Option<String>,
    pub meeting_link: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl AssessmentPatch {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("material", &self.material),
            ("projection", &self.projection),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        if let Some(link) = &self.meeting_link {
            validate_link(link)?;
        }
        Ok(())
    }

    pub fn apply(self, assessment: &mut Assessment) {
        if let Some(title) = self.title {
            assessment.title = title;
        }
        if let Some(material) = self.material {
            assessment.material = material;
        }
        if let Some(projection) = self.projection {
            assessment.projection = projection;
        }
        if let Some(method) = self.method {
            assessment.method = method;
        }
        if let Some(room) = self.room {
            assessment.room = Some(room);
        }
        if let Some(link) = self.meeting_link {
            assessment.meeting_link = Some(link);
        }
        if let Some(schedule) = self.schedule {
            assessment.schedule = Some(schedule);
            assessment.expiry = Some(expiry_for(schedule));
        }
        if let Some(active) = self.is_active {
            assessment.is_active = active;
        }
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn validate_link(link: &str) -> Result<()> {
    if link.starts_with("https://") || link.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::Validation("Invalid meeting link format".into()))
    }
}

/// Input for attaching a person to an existing assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    pub person_id: String,
    /// Row id in `assessment_roles`
    pub role_id: i64,
    #[serde(default)]
    pub schedule: Option<DateTime<Utc>>,
}

/// Requirement submission from a participant
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub attendance_confirmed: bool,
    /// Newly uploaded presentation; the stored one is kept when absent
    pub presentation: Option<Upload>,
    /// New answers; the stored ones are kept when absent or empty
    pub questionnaire_responses: Option<Answers>,
}

impl Submission {
    pub(crate) fn new_answers(&self) -> Option<&Answers> {
        self.questionnaire_responses
            .as_ref()
            .filter(|answers| !answers.is_empty())
    }
}

/// Role-tagged link between a person and an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLink {
    pub id: String,
    pub assessment_id: String,
    pub person_id: String,
    pub role: ParticipantRole,
    /// Only ever set for `PARTICIPANT` links
    pub status: Option<AssessmentStatus>,
    pub schedule: Option<DateTime<Utc>>,
    pub expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Participant link joined with the linked person
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    #[serde(flatten)]
    pub link: ParticipantLink,
    pub person: PersonSummary,
}

/// Evaluation joined with its evaluator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub evaluator: PersonSummary,
}

/// The one read projection shared by every assessment read path
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    #[serde(flatten)]
    pub assessment: Assessment,
    pub participant: Option<PersonSummary>,
    pub participants: Vec<ParticipantView>,
    pub evaluations: Vec<EvaluationView>,
}

/// An active assessment scheduled close to a requested slot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub id: String,
    pub title: String,
    pub schedule: DateTime<Utc>,
    pub status: AssessmentStatus,
}

/// Filters for listing assessments
#[derive(Debug, Clone, Default)]
pub struct AssessmentQuery {
    pub status: Option<AssessmentStatus>,
    pub method: Option<DeliveryMethod>,
    pub participant_id: Option<String>,
    pub evaluator_id: Option<String>,
    /// Case-insensitive match on title, material or projection
    pub search: Option<String>,
    pub include_inactive: bool,
    /// 1-based page number
    pub page: u32,
    /// Page size (default 10, max 100)
    pub limit: u32,
}

impl AssessmentQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            limit: 10,
            ..Default::default()
        }
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, 100)
    }

    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Rows to skip; wide enough that no page number can overflow it
    pub fn offset(&self) -> i64 {
        i64::from(self.effective_page() - 1) * i64::from(self.effective_limit())
    }
}

/// Pagination metadata returned next to list results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total: u32,
    pub page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMetadata {
    pub fn new(total: u32, page: u32, limit: u32) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            total,
            page,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: PageMetadata,
}
