//! Participant and evaluator links, batch creation and schedule checks

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::events::AssessmentEvent;
use crate::model::{
    Assessment, AssessmentStatus, BatchCreated, Evaluation, EvaluationStatus, NewAssessmentBatch,
    NewParticipant, ParticipantLink, ParticipantRole, ParticipantView, ScheduleConflict, Scores,
    expiry_for,
};
use crate::store::{assessments, detail, evaluations, participants, people};

/// Manages the people attached to assessments
#[derive(Clone)]
pub struct ParticipantCoordinator {
    ctx: Arc<Context>,
}

impl ParticipantCoordinator {
    pub(crate) fn new(ctx: Arc<Context>) -> Self {
        Self { ctx }
    }

    /// Create one assessment per participant, each with one pending
    /// evaluation per evaluator, in a single transaction
    pub async fn create_batch(&self, batch: NewAssessmentBatch) -> Result<BatchCreated> {
        batch.assessment.validate()?;
        if batch.participants.is_empty() {
            return Err(Error::Validation("At least one participant is required".into()));
        }
        let max = self.ctx.config.max_evaluators;
        if batch.evaluators.is_empty() || batch.evaluators.len() > max {
            return Err(Error::Validation(format!(
                "Between 1 and {max} evaluators are required"
            )));
        }

        let created = self.ctx.store.transaction(|tx| {
            for participant in &batch.participants {
                if !people::exists(tx, &participant.participant_id)? {
                    return Err(Error::NotFound("One or more participants not found".into()));
                }
            }
            for evaluator in &batch.evaluators {
                if !people::exists(tx, evaluator)? {
                    return Err(Error::NotFound("One or more evaluators not found".into()));
                }
            }

            let evaluator_set: HashSet<&str> =
                batch.evaluators.iter().map(String::as_str).collect();
            if evaluator_set.len() != batch.evaluators.len() {
                return Err(Error::BadRequest(
                    "Duplicate evaluators are not allowed".into(),
                ));
            }
            if batch
                .participants
                .iter()
                .any(|p| evaluator_set.contains(p.participant_id.as_str()))
            {
                return Err(Error::BadRequest(
                    "A participant cannot be an evaluator".into(),
                ));
            }

            let template = &batch.assessment;
            let mut created = Vec::with_capacity(batch.participants.len());
            for participant in &batch.participants {
                let now = Utc::now();
                let expiry = expiry_for(participant.schedule);
                let assessment = Assessment {
                    id: Uuid::new_v4().to_string(),
                    title: template.title.clone(),
                    material: template.material.clone(),
                    projection: template.projection.clone(),
                    method: template.method,
                    room: template.room.clone(),
                    meeting_link: template.meeting_link.clone(),
                    participant_id: Some(participant.participant_id.clone()),
                    schedule: Some(participant.schedule),
                    expiry: Some(expiry),
                    status: AssessmentStatus::Created,
                    attendance_confirmed: false,
                    questionnaire_responses: None,
                    presentation_file: None,
                    questionnaire_file: None,
                    nota_dinas_file: None,
                    is_active: template.is_active,
                    created_at: now,
                    updated_at: now,
                };
                assessments::insert(tx, &assessment)?;

                participants::insert(
                    tx,
                    &new_link(
                        &assessment.id,
                        &participant.participant_id,
                        ParticipantRole::Participant,
                        Some(participant.schedule),
                    ),
                )?;

                for evaluator in &batch.evaluators {
                    participants::insert(
                        tx,
                        &new_link(&assessment.id, evaluator, ParticipantRole::Evaluator, None),
                    )?;
                    evaluations::insert(
                        tx,
                        &Evaluation {
                            id: Uuid::new_v4().to_string(),
                            assessment_id: assessment.id.clone(),
                            evaluator_id: evaluator.clone(),
                            scores: Scores::new(),
                            recommendation: None,
                            status: EvaluationStatus::Pending,
                            artifact: None,
                            created_at: now,
                            updated_at: now,
                        },
                    )?;
                }

                created.push(detail::expand(tx, assessment)?);
            }
            Ok(created)
        })?;

        info!(
            assessments = created.len(),
            evaluators = batch.evaluators.len(),
            "Assessment batch created"
        );
        for detail in &created {
            self.ctx
                .publish(AssessmentEvent::Created {
                    assessment_id: detail.assessment.id.clone(),
                    participant_id: detail.assessment.participant_id.clone(),
                })
                .await;
        }

        Ok(BatchCreated {
            created_count: created.len(),
            assessments: created,
        })
    }

    /// Attach a person to an assessment under the given role
    pub fn add(&self, assessment_id: &str, input: NewParticipant) -> Result<ParticipantView> {
        self.ctx.store.transaction(|tx| {
            assessments::require(tx, assessment_id)?;
            let role = participants::role(tx, input.role_id)?;
            let person = people::get(tx, &input.person_id)?
                .ok_or_else(|| Error::not_found("Person", &input.person_id))?;
            if participants::find_by_person(tx, assessment_id, &input.person_id)?.is_some() {
                return Err(Error::Conflict(
                    "Participant already exists in this assessment".into(),
                ));
            }

            let schedule = match role {
                ParticipantRole::Participant => input.schedule,
                ParticipantRole::Evaluator => None,
            };
            let link = new_link(assessment_id, &person.id, role, schedule);
            participants::insert(tx, &link)?;

            info!(assessment_id, person_id = %person.id, role = role.as_str(), "Participant added");
            Ok(ParticipantView {
                link,
                person: person.summary(),
            })
        })
    }

    /// Detach a link; evaluations already recorded by the person are kept
    pub fn remove(&self, assessment_id: &str, link_id: &str) -> Result<()> {
        self.ctx.store.transaction(|tx| {
            require_link(tx, assessment_id, link_id)?;
            participants::delete(tx, link_id)
        })?;
        info!(assessment_id, link_id, "Participant removed");
        Ok(())
    }

    /// Set the individual status of a `PARTICIPANT` link
    pub fn update_status(
        &self,
        assessment_id: &str,
        link_id: &str,
        status: AssessmentStatus,
    ) -> Result<ParticipantLink> {
        self.ctx.store.transaction(|tx| {
            let mut link = require_participant_link(tx, assessment_id, link_id, "Status")?;
            link.status = Some(status);
            participants::update_state(tx, &link)?;
            Ok(link)
        })
    }

    /// Reschedule a `PARTICIPANT` link, recomputing its expiry and marking
    /// it `SCHEDULED`
    pub fn update_schedule(
        &self,
        assessment_id: &str,
        link_id: &str,
        schedule: DateTime<Utc>,
    ) -> Result<ParticipantLink> {
        self.ctx.store.transaction(|tx| {
            let mut link = require_participant_link(tx, assessment_id, link_id, "Schedule")?;
            link.schedule = Some(schedule);
            link.expiry = Some(expiry_for(schedule));
            link.status = Some(AssessmentStatus::Scheduled);
            participants::update_state(tx, &link)?;
            Ok(link)
        })
    }

    /// Active assessments of `person_id` starting within the conflict window
    /// after `schedule`.
    ///
    /// Advisory only: nothing on the write path calls this.
    pub fn check_schedule_conflicts(
        &self,
        person_id: &str,
        schedule: DateTime<Utc>,
        exclude_assessment: Option<&str>,
    ) -> Result<Vec<ScheduleConflict>> {
        self.ctx.store.read(|conn| {
            assessments::schedule_conflicts(conn, person_id, schedule, exclude_assessment)
        })
    }
}

fn new_link(
    assessment_id: &str,
    person_id: &str,
    role: ParticipantRole,
    schedule: Option<DateTime<Utc>>,
) -> ParticipantLink {
    let status = match (role, schedule) {
        (ParticipantRole::Evaluator, _) => None,
        (ParticipantRole::Participant, Some(_)) => Some(AssessmentStatus::Scheduled),
        (ParticipantRole::Participant, None) => Some(AssessmentStatus::Created),
    };
    ParticipantLink {
        id: Uuid::new_v4().to_string(),
        assessment_id: assessment_id.to_string(),
        person_id: person_id.to_string(),
        role,
        status,
        schedule,
        expiry: schedule.map(expiry_for),
        created_at: Utc::now(),
    }
}

fn require_link(
    conn: &rusqlite::Connection,
    assessment_id: &str,
    link_id: &str,
) -> Result<ParticipantLink> {
    participants::get(conn, assessment_id, link_id)?
        .ok_or_else(|| Error::NotFound("Participant not found in this assessment".into()))
}

fn require_participant_link(
    conn: &rusqlite::Connection,
    assessment_id: &str,
    link_id: &str,
    what: &str,
) -> Result<ParticipantLink> {
    let link = require_link(conn, assessment_id, link_id)?;
    if link.role != ParticipantRole::Participant {
        return Err(Error::BadRequest(format!(
            "{what} can only be updated for participants, not evaluators"
        )));
    }
    Ok(link)
}
