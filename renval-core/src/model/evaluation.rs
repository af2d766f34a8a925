//! Evaluation records and their inputs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::assessment::ArtifactRef;
use super::status::{EvaluationStatus, SystemRole};
use crate::error::{Error, Result};

/// Grade on the evaluation sheet scale, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// Kurang
    K,
    /// Cukup kurang
    CK,
    /// Cukup baik
    CB,
    /// Baik
    B,
}

/// Rating for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub rating: Grade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Criterion key to rating
pub type Scores = BTreeMap<String, Rating>;

pub(crate) fn validate_scores(scores: &Scores) -> Result<()> {
    if scores.keys().any(|key| key.trim().is_empty()) {
        return Err(Error::Validation("Invalid scores format".into()));
    }
    Ok(())
}

/// One evaluator's scoring work on one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub assessment_id: String,
    pub evaluator_id: String,
    pub scores: Scores,
    pub recommendation: Option<String>,
    pub status: EvaluationStatus,
    /// Generated evaluation sheet, present once the evaluation is completed
    pub artifact: Option<ArtifactRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewEvaluation {
    pub scores: Scores,
    pub recommendation: Option<String>,
    pub status: Option<EvaluationStatus>,
}

/// Partial update; unset fields are kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationPatch {
    pub scores: Option<Scores>,
    pub recommendation: Option<String>,
    pub status: Option<EvaluationStatus>,
}

impl EvaluationPatch {
    pub fn validate(&self) -> Result<()> {
        match &self.scores {
            Some(scores) => validate_scores(scores),
            None => Ok(()),
        }
    }

    pub fn apply(self, evaluation: &mut Evaluation) {
        if let Some(scores) = self.scores {
            evaluation.scores = scores;
        }
        if let Some(recommendation) = self.recommendation {
            evaluation.recommendation = Some(recommendation);
        }
        if let Some(status) = self.status {
            evaluation.status = status;
        }
    }
}

/// Outcome of an evaluation update.
///
/// The data mutation has been committed whenever this is returned;
/// `artifact_error` reports a failed sheet generation that did not roll it
/// back.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationUpdate {
    pub evaluation: Evaluation,
    pub artifact_error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationQuery {
    pub status: Option<EvaluationStatus>,
    pub assessment_id: Option<String>,
    pub evaluator_id: Option<String>,
}

/// The person performing an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub person_id: String,
    pub role: SystemRole,
}

impl Actor {
    pub fn new(person_id: impl Into<String>, role: SystemRole) -> Self {
        Self {
            person_id: person_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == SystemRole::Administrator
    }

    /// Administrators may touch any evaluation, evaluators only their own
    pub fn may_modify(&self, evaluation: &Evaluation) -> bool {
        self.is_admin() || self.person_id == evaluation.evaluator_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation() -> Evaluation {
        let now = Utc::now();
        Evaluation {
            id: "e1".into(),
            assessment_id: "a1".into(),
            evaluator_id: "p-eval".into(),
            scores: Scores::new(),
            recommendation: Some("Ready".into()),
            status: EvaluationStatus::Pending,
            artifact: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_retains_unspecified_fields() {
        let mut eval = evaluation();
        EvaluationPatch {
            status: Some(EvaluationStatus::InProgress),
            ..Default::default()
        }
        .apply(&mut eval);

        assert_eq!(eval.status, EvaluationStatus::InProgress);
        assert_eq!(eval.recommendation.as_deref(), Some("Ready"));
    }

    #[test]
    fn blank_criterion_key_is_rejected() {
        let mut scores = Scores::new();
        scores.insert(
            " ".into(),
            Rating {
                rating: Grade::CB,
                notes: None,
            },
        );
        let patch = EvaluationPatch {
            scores: Some(scores),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn owner_and_admin_may_modify() {
        let eval = evaluation();
        assert!(Actor::new("p-eval", SystemRole::User).may_modify(&eval));
        assert!(Actor::new("someone", SystemRole::Administrator).may_modify(&eval));
        assert!(!Actor::new("someone", SystemRole::User).may_modify(&eval));
    }

    #[test]
    fn rating_notes_are_optional_in_json() {
        let rating: Rating = serde_json::from_str(r#"{"rating": "CB"}"#).unwrap();
        assert_eq!(rating.rating, Grade::CB);
        assert_eq!(rating.notes, None);
        assert_eq!(serde_json::to_string(&rating).unwrap(), r#"{"rating":"CB"}"#);
    }

    #[test]
    fn ratings_outside_the_scale_are_rejected() {
        for raw in [r#"{"rating": "A"}"#, r#"{"rating": 4}"#, r#"{"rating": "b"}"#] {
            assert!(serde_json::from_str::<Rating>(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn grades_order_from_lowest() {
        assert!(Grade::K < Grade::CK);
        assert!(Grade::CK < Grade::CB);
        assert!(Grade::CB < Grade::B);
    }
}
