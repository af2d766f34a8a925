//! The assessment detail projection
//!
//! Every assessment read path goes through [`load`], so the shape returned by
//! get, list, batch creation and transitions never drifts between call sites.

use std::collections::HashMap;

use rusqlite::Connection;

use super::{assessments, evaluations, participants, people};
use crate::error::Result;
use crate::model::{
    Assessment, AssessmentDetail, EvaluationView, ParticipantView, PersonSummary,
};

/// Load one assessment and everything attached to it
pub(crate) fn load(conn: &Connection, id: &str) -> Result<AssessmentDetail> {
    let assessment = assessments::require(conn, id)?;
    expand(conn, assessment)
}

/// Attach people, links and evaluations to an already loaded row
pub(crate) fn expand(conn: &Connection, assessment: Assessment) -> Result<AssessmentDetail> {
    let mut summaries = SummaryCache::default();

    let participant = match assessment.participant_id.as_deref() {
        Some(person_id) => summaries.get(conn, person_id)?,
        None => None,
    };

    let mut links = Vec::new();
    for link in participants::list_for_assessment(conn, &assessment.id)? {
        if let Some(person) = summaries.get(conn, &link.person_id)? {
            links.push(ParticipantView { link, person });
        }
    }

    let mut views = Vec::new();
    for evaluation in evaluations::list_for_assessment(conn, &assessment.id)? {
        if let Some(evaluator) = summaries.get(conn, &evaluation.evaluator_id)? {
            views.push(EvaluationView {
                evaluation,
                evaluator,
            });
        }
    }

    Ok(AssessmentDetail {
        assessment,
        participant,
        participants: links,
        evaluations: views,
    })
}

#[derive(Default)]
struct SummaryCache(HashMap<String, Option<PersonSummary>>);

impl SummaryCache {
    fn get(&mut self, conn: &Connection, person_id: &str) -> Result<Option<PersonSummary>> {
        if let Some(cached) = self.0.get(person_id) {
            return Ok(cached.clone());
        }
        let summary = people::get(conn, person_id)?.map(|p| p.summary());
        self.0.insert(person_id.to_string(), summary.clone());
        Ok(summary)
    }
}
