//! Evaluation records: one evaluator's scoring work on one assessment

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborators::EvaluationDocument;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::events::AssessmentEvent;
use crate::lifecycle::{self, Command, TransitionCause};
use crate::model::{
    Actor, ArtifactRef, AssessmentStatus, Evaluation, EvaluationPatch, EvaluationQuery,
    EvaluationStatus, EvaluationUpdate, NewEvaluation, ParticipantRole, StoredFile,
    validate_scores,
};
use crate::store::{assessments, evaluations, participants, people};

#[derive(Clone)]
pub struct EvaluationManager {
    ctx: Arc<Context>,
}

impl EvaluationManager {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    pub fn get(&self, id: &str) -> Result<Evaluation> {
        self.ctx.store.read(|conn| evaluations::require(conn, id))
    }

    pub fn list(&self, query: &EvaluationQuery) -> Result<Vec<Evaluation>> {
        self.ctx.store.read(|conn| evaluations::list(conn, query))
    }

    /// The generated evaluation sheet of a completed evaluation
    pub async fn sheet(&self, id: &str) -> Result<StoredFile> {
        let evaluation = self.get(id)?;
        let artifact = evaluation.artifact.ok_or_else(|| {
            Error::NotFound("Evaluation sheet has not been generated".into())
        })?;
        self.ctx.fetch(artifact).await
    }

    /// Attach an evaluation by `evaluator_id` to an assessment
    pub async fn create(
        &self,
        assessment_id: &str,
        evaluator_id: &str,
        input: NewEvaluation,
    ) -> Result<Evaluation> {
        validate_scores(&input.scores)?;

        let evaluation = self.ctx.store.transaction(|tx| {
            let assessment = assessments::require(tx, assessment_id)?;
            if !people::exists(tx, evaluator_id)? {
                return Err(Error::not_found("Evaluator", evaluator_id));
            }
            if evaluations::find(tx, assessment_id, evaluator_id)?.is_some() {
                return Err(Error::Conflict(
                    "Evaluation already exists for this assessment".into(),
                ));
            }
            let is_participant = assessment.participant_id.as_deref() == Some(evaluator_id)
                || participants::find_by_person(tx, assessment_id, evaluator_id)?
                    .is_some_and(|link| link.role == ParticipantRole::Participant);
            if is_participant {
                return Err(Error::BadRequest(
                    "A participant cannot evaluate their own assessment".into(),
                ));
            }
            let (total, _) = evaluations::progress(tx, assessment_id)?;
            let max = self.ctx.config.max_evaluators;
            if total >= max {
                return Err(Error::PreconditionFailed(format!(
                    "Assessment already has the maximum of {max} evaluators"
                )));
            }

            let now = Utc::now();
            let evaluation = Evaluation {
                id: Uuid::new_v4().to_string(),
                assessment_id: assessment_id.to_string(),
                evaluator_id: evaluator_id.to_string(),
                scores: input.scores,
                recommendation: input.recommendation,
                status: input.status.unwrap_or_default(),
                artifact: None,
                created_at: now,
                updated_at: now,
            };
            evaluations::insert(tx, &evaluation)?;
            Ok(evaluation)
        })?;

        info!(evaluation_id = %evaluation.id, assessment_id, evaluator_id, "Evaluation created");
        self.published(&evaluation).await;
        Ok(evaluation)
    }

    /// Apply a partial update as the owning evaluator or an administrator.
    ///
    /// When the evaluation ends up `COMPLETED` the parent assessment is moved
    /// to `NEED_REVIEW` in the same transaction and a fresh evaluation sheet
    /// is rendered after commit. A render failure is reported through
    /// [`EvaluationUpdate::artifact_error`] and never undoes the update.
    pub async fn update(
        &self,
        id: &str,
        actor: &Actor,
        patch: EvaluationPatch,
    ) -> Result<EvaluationUpdate> {
        patch.validate()?;

        let (mut evaluation, stale, change) = self.ctx.store.transaction(|tx| {
            let mut evaluation = require_modifiable(tx, id, actor, "update")?;
            patch.apply(&mut evaluation);
            evaluation.updated_at = Utc::now();
            evaluations::update(tx, &evaluation)?;

            let stale = evaluations::take_file(tx, id)?;
            evaluation.artifact = None;

            let change = if evaluation.status == EvaluationStatus::Completed {
                lifecycle::apply(
                    tx,
                    &evaluation.assessment_id,
                    Command::Propagate(AssessmentStatus::NeedReview),
                    TransitionCause::EvaluationCompleted,
                )?
            } else {
                None
            };
            Ok((evaluation, stale, change))
        })?;

        info!(evaluation_id = %id, status = %evaluation.status, "Evaluation updated");
        self.ctx.release(stale).await;
        self.published(&evaluation).await;
        self.ctx.publish_change(change).await;

        let mut artifact_error = None;
        if evaluation.status == EvaluationStatus::Completed {
            match self.render_sheet(&evaluation).await {
                Ok(artifact) => evaluation.artifact = Some(artifact),
                Err(e) => {
                    warn!(evaluation_id = %id, error = %e, "Evaluation sheet generation failed");
                    artifact_error = Some(e.to_string());
                }
            }
        }

        Ok(EvaluationUpdate {
            evaluation,
            artifact_error,
        })
    }

    /// Delete an evaluation and its generated sheet
    pub async fn delete(&self, id: &str, actor: &Actor) -> Result<()> {
        let evaluation = self.ctx.store.transaction(|tx| {
            let evaluation = require_modifiable(tx, id, actor, "delete")?;
            evaluations::delete(tx, id)?;
            Ok(evaluation)
        })?;

        info!(evaluation_id = %id, assessment_id = %evaluation.assessment_id, "Evaluation deleted");
        self.ctx.release(evaluation.artifact).await;
        Ok(())
    }

    async fn render_sheet(&self, evaluation: &Evaluation) -> Result<ArtifactRef> {
        let document = self.ctx.store.read(|conn| {
            let assessment = assessments::require(conn, &evaluation.assessment_id)?;
            let participant = match assessment.participant_id.as_deref() {
                Some(person_id) => people::get(conn, person_id)?.map(|p| p.summary()),
                None => None,
            };
            Ok(EvaluationDocument {
                evaluation_id: evaluation.id.clone(),
                assessment_id: assessment.id,
                participant,
                projection: assessment.projection,
                schedule: assessment.schedule,
                scores: evaluation.scores.clone(),
                recommendation: evaluation.recommendation.clone(),
                evaluator: people::get(conn, &evaluation.evaluator_id)?.map(|p| p.summary()),
            })
        })?;

        let artifact = self.ctx.renderer.render_evaluation(&document).await?;
        let attached = self
            .ctx
            .store
            .transaction(|tx| evaluations::attach_file(tx, &evaluation.id, &artifact));
        if let Err(e) = attached {
            self.ctx.release(Some(artifact)).await;
            return Err(e);
        }
        Ok(artifact)
    }

    async fn published(&self, evaluation: &Evaluation) {
        self.ctx
            .publish(AssessmentEvent::EvaluationUpdated {
                assessment_id: evaluation.assessment_id.clone(),
                evaluation_id: evaluation.id.clone(),
                status: evaluation.status,
            })
            .await;
    }
}

fn require_modifiable(
    conn: &Connection,
    id: &str,
    actor: &Actor,
    action: &str,
) -> Result<Evaluation> {
    let evaluation = evaluations::require(conn, id)?;
    if !actor.may_modify(&evaluation) {
        return Err(Error::Forbidden(format!(
            "Unauthorized to {action} this evaluation"
        )));
    }
    Ok(evaluation)
}
