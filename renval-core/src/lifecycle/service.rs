//! Assessment reads and every status-changing entry point

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::machine;
use super::transitions::{Command, Override, TransitionCause};
use crate::collaborators::Notification;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::events::AssessmentEvent;
use crate::model::{
    Assessment, AssessmentDetail, AssessmentFile, AssessmentPatch, AssessmentQuery,
    AssessmentStatus, Page, PageMetadata, ParticipantRole, StoredFile, Upload,
};
use crate::store::{assessments, detail, evaluations, participants, people};

/// Owns the assessment lifecycle
#[derive(Clone)]
pub struct AssessmentService {
    ctx: Arc<Context>,
}

impl AssessmentService {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub fn get(&self, id: &str) -> Result<AssessmentDetail> {
        self.ctx.store.read(|conn| detail::load(conn, id))
    }

    /// One page of assessments, newest first
    pub fn list(&self, query: &AssessmentQuery) -> Result<Page<AssessmentDetail>> {
        self.ctx.store.read(|conn| {
            let (rows, total) = assessments::list(conn, query)?;
            let items = rows
                .into_iter()
                .map(|assessment| detail::expand(conn, assessment))
                .collect::<Result<Vec<_>>>()?;
            Ok(Page {
                items,
                metadata: PageMetadata::new(
                    total,
                    query.effective_page(),
                    query.effective_limit(),
                ),
            })
        })
    }

    /// Move along the transition table, subject to its guards
    pub async fn request_transition(
        &self,
        id: &str,
        target: AssessmentStatus,
    ) -> Result<AssessmentDetail> {
        self.run(id, Command::Transition(target), TransitionCause::Request)
            .await
    }

    /// Notify the participant and move `SCHEDULED` to `WAITING_CONFIRMATION`.
    ///
    /// A failed delivery leaves the status untouched and surfaces the
    /// dispatcher's error.
    pub async fn send_invitation(&self, id: &str) -> Result<AssessmentDetail> {
        let notification = self.ctx.store.read(|conn| {
            let assessment = assessments::require(conn, id)?;
            if assessment.status != AssessmentStatus::Scheduled {
                return Err(Error::InvalidTransition {
                    from: assessment.status,
                    to: AssessmentStatus::WaitingConfirmation,
                });
            }

            let person_id = match assessment.participant_id.clone() {
                Some(person_id) => Some(person_id),
                None => participants::list_for_assessment(conn, id)?
                    .into_iter()
                    .find(|link| link.role == ParticipantRole::Participant)
                    .map(|link| link.person_id),
            };
            let person = match person_id {
                Some(person_id) => people::get(conn, &person_id)?,
                None => None,
            }
            .ok_or_else(|| {
                Error::PreconditionFailed("Assessment has no participant to invite".into())
            })?;

            let recipient = person
                .phone
                .filter(|phone| !phone.trim().is_empty())
                .ok_or_else(|| {
                    Error::PreconditionFailed(format!(
                        "Participant {} has no phone number",
                        person.name
                    ))
                })?;

            Ok(Notification {
                recipient,
                template: self.ctx.config.invitation_template.clone(),
                variables: BTreeMap::from([
                    ("name".to_string(), person.name),
                    ("grade".to_string(), assessment.projection),
                    ("link".to_string(), self.ctx.config.portal_link.clone()),
                ]),
            })
        })?;

        self.ctx.dispatcher.send(&notification).await?;
        info!(assessment_id = %id, "Invitation sent");
        self.ctx
            .publish(AssessmentEvent::InvitationSent {
                assessment_id: id.to_string(),
                recipient: notification.recipient,
            })
            .await;

        self.run(
            id,
            Command::Transition(AssessmentStatus::WaitingConfirmation),
            TransitionCause::Invitation,
        )
        .await
    }

    /// Administrative entry into `EVALUATING` from any status but `DONE`,
    /// without the evaluator guard
    pub async fn start_evaluation(&self, id: &str) -> Result<AssessmentDetail> {
        self.run(
            id,
            Command::Override(Override::StartEvaluation),
            TransitionCause::StartEvaluation,
        )
        .await
    }

    /// Back to `SCHEDULED`, discarding attendance, answers and the submitted
    /// presentation and questionnaire
    pub async fn reset_to_scheduled(&self, id: &str) -> Result<AssessmentDetail> {
        let (change, released, detail) = self.ctx.store.transaction(|tx| {
            let change = machine::apply(
                tx,
                id,
                Command::Override(Override::ResetToScheduled),
                TransitionCause::Reset,
            )?;

            let mut assessment = assessments::require(tx, id)?;
            let released: Vec<_> = [
                assessment.presentation_file.take(),
                assessment.questionnaire_file.take(),
            ]
            .into_iter()
            .flatten()
            .collect();
            assessment.attendance_confirmed = false;
            assessment.questionnaire_responses = None;
            assessments::update_fields(tx, &assessment)?;

            Ok((change, released, detail::load(tx, id)?))
        })?;

        self.ctx.release(released).await;
        self.ctx.publish_change(change).await;
        Ok(detail)
    }

    /// Patch descriptive fields; refused once the assessment is finalized
    pub async fn update(&self, id: &str, patch: AssessmentPatch) -> Result<AssessmentDetail> {
        patch.validate()?;

        self.ctx.store.transaction(|tx| {
            let mut assessment = require_editable(tx, id)?;
            patch.apply(&mut assessment);
            assessment.updated_at = Utc::now();
            assessments::update_fields(tx, &assessment)?;
            detail::load(tx, id)
        })
    }

    /// Store an official memo for the assessment, replacing any earlier one
    pub async fn attach_memo(&self, id: &str, upload: Upload) -> Result<AssessmentDetail> {
        upload.validate(AssessmentFile::NotaDinas)?;
        self.ctx.store.read(|conn| require_editable(conn, id))?;

        let memo = self
            .ctx
            .store_upload(AssessmentFile::NotaDinas, id, &upload)
            .await?;
        let outcome = self.ctx.store.transaction(|tx| {
            let mut assessment = require_editable(tx, id)?;
            let replaced = assessment.nota_dinas_file.replace(memo.clone());
            assessment.updated_at = Utc::now();
            assessments::update_fields(tx, &assessment)?;
            Ok((replaced, detail::load(tx, id)?))
        });

        match outcome {
            Ok((replaced, detail)) => {
                info!(assessment_id = %id, memo = %memo, "Memo attached");
                self.ctx.release(replaced).await;
                Ok(detail)
            }
            Err(e) => {
                self.ctx.release(Some(memo)).await;
                Err(e)
            }
        }
    }

    /// Bytes of one of the files an assessment owns
    pub async fn file(&self, id: &str, kind: AssessmentFile) -> Result<StoredFile> {
        let assessment = self.ctx.store.read(|conn| assessments::require(conn, id))?;
        let artifact = match kind {
            AssessmentFile::Presentation => assessment.presentation_file,
            AssessmentFile::Questionnaire => assessment.questionnaire_file,
            AssessmentFile::NotaDinas => assessment.nota_dinas_file,
        }
        .ok_or_else(|| Error::NotFound(format!("Assessment has no {kind} file")))?;
        self.ctx.fetch(artifact).await
    }

    /// Remove the assessment with its evaluations, links and artifacts
    pub async fn delete(&self, id: &str) -> Result<()> {
        let released = self.ctx.store.transaction(|tx| {
            let assessment = assessments::require(tx, id)?;
            let mut released = evaluations::delete_for_assessment(tx, id)?;
            participants::delete_for_assessment(tx, id)?;
            assessments::delete(tx, id)?;
            released.extend(assessment.artifacts());
            Ok(released)
        })?;

        info!(assessment_id = %id, artifacts = released.len(), "Assessment deleted");
        self.ctx.release(released).await;
        self.ctx
            .publish(AssessmentEvent::Deleted {
                assessment_id: id.to_string(),
            })
            .await;
        Ok(())
    }

    async fn run(
        &self,
        id: &str,
        command: Command,
        cause: TransitionCause,
    ) -> Result<AssessmentDetail> {
        let (change, detail) = self.ctx.store.transaction(|tx| {
            let change = machine::apply(tx, id, command, cause)?;
            Ok((change, detail::load(tx, id)?))
        })?;
        self.ctx.publish_change(change).await;
        Ok(detail)
    }
}

/// Load an assessment that may still have its fields changed
fn require_editable(conn: &rusqlite::Connection, id: &str) -> Result<Assessment> {
    let assessment = assessments::require(conn, id)?;
    if assessment.status.is_finalized() {
        return Err(Error::PreconditionFailed(format!(
            "Cannot update assessment in {} status",
            assessment.status
        )));
    }
    Ok(assessment)
}
