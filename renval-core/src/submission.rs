//! Requirement submissions and the status they imply

use std::sync::Arc;

use tracing::info;

use crate::collaborators::QuestionnaireDocument;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::lifecycle::{self, Command, TransitionCause};
use crate::model::{AssessmentDetail, AssessmentFile, AssessmentStatus, Submission};
use crate::store::{assessments, detail, people};

/// Status implied by what a participant has submitted so far
pub fn derive_status(
    attendance_confirmed: bool,
    has_presentation: bool,
    has_answers: bool,
) -> AssessmentStatus {
    match (attendance_confirmed, has_presentation, has_answers) {
        (true, true, true) => AssessmentStatus::ReadyForAssessment,
        (false, false, false) => AssessmentStatus::Canceled,
        _ => AssessmentStatus::TalentRequirements,
    }
}

#[derive(Clone)]
pub struct SubmissionTracker {
    ctx: Arc<Context>,
}

impl SubmissionTracker {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Store a submission and move the assessment to the status it implies.
    ///
    /// New answers are rendered into a questionnaire document and a new
    /// presentation is stored under a key owned by this assessment before
    /// anything is written; a failure in either aborts the submission.
    /// Replaced presentation and questionnaire artifacts are released after
    /// commit.
    pub async fn record_submission(
        &self,
        assessment_id: &str,
        submission: Submission,
    ) -> Result<AssessmentDetail> {
        if let Some(upload) = &submission.presentation {
            upload.validate(AssessmentFile::Presentation)?;
        }

        let document = self.ctx.store.read(|conn| {
            let assessment = assessments::require(conn, assessment_id)?;
            if assessment.status.is_finalized() {
                return Err(Error::PreconditionFailed(format!(
                    "Cannot update assessment in {} status",
                    assessment.status
                )));
            }
            let Some(answers) = submission.new_answers() else {
                return Ok(None);
            };
            let participant = match assessment.participant_id.as_deref() {
                Some(person_id) => people::get(conn, person_id)?.map(|p| p.summary()),
                None => None,
            };
            Ok(Some(QuestionnaireDocument {
                assessment_id: assessment.id,
                title: assessment.title,
                projection: assessment.projection,
                participant,
                answers: answers.clone(),
            }))
        })?;

        let rendered = match &document {
            Some(document) => Some(self.ctx.renderer.render_questionnaire(document).await?),
            None => None,
        };
        let presentation = match &submission.presentation {
            Some(upload) => {
                let stored = self
                    .ctx
                    .store_upload(AssessmentFile::Presentation, assessment_id, upload)
                    .await;
                match stored {
                    Ok(artifact) => Some(artifact),
                    Err(e) => {
                        self.ctx.release(rendered).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let outcome = self.ctx.store.transaction(|tx| {
            let current = assessments::require(tx, assessment_id)?;
            let status = derive_status(
                submission.attendance_confirmed,
                presentation.is_some() || current.presentation_file.is_some(),
                submission.new_answers().is_some() || current.has_answers(),
            );
            let change = lifecycle::apply(
                tx,
                assessment_id,
                Command::Submission(status),
                TransitionCause::Submission,
            )?;

            let mut assessment = assessments::require(tx, assessment_id)?;
            let mut released = Vec::new();
            assessment.attendance_confirmed = submission.attendance_confirmed;
            if let Some(presentation) = presentation.clone() {
                released.extend(assessment.presentation_file.replace(presentation));
            }
            if let Some(questionnaire) = rendered.clone() {
                released.extend(assessment.questionnaire_file.replace(questionnaire));
                assessment.questionnaire_responses = submission.new_answers().cloned();
            }
            assessments::update_fields(tx, &assessment)?;
            Ok((change, released, detail::load(tx, assessment_id)?))
        });

        let (change, released, detail) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.ctx.release(rendered.into_iter().chain(presentation)).await;
                return Err(e);
            }
        };

        info!(
            assessment_id,
            status = %detail.assessment.status,
            "Submission recorded"
        );
        self.ctx.release(released).await;
        self.ctx.publish_change(change).await;
        Ok(detail)
    }
}
