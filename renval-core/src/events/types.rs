use serde::{Deserialize, Serialize};

use crate::lifecycle::TransitionCause;
use crate::model::{AssessmentStatus, EvaluationStatus};

/// Something that happened to an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssessmentEvent {
    Created {
        assessment_id: String,
        participant_id: Option<String>,
    },
    StatusChanged {
        assessment_id: String,
        from: AssessmentStatus,
        to: AssessmentStatus,
        cause: TransitionCause,
    },
    InvitationSent {
        assessment_id: String,
        recipient: String,
    },
    EvaluationUpdated {
        assessment_id: String,
        evaluation_id: String,
        status: EvaluationStatus,
    },
    Deleted {
        assessment_id: String,
    },
}

impl AssessmentEvent {
    /// The serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::StatusChanged { .. } => "status_changed",
            Self::InvitationSent { .. } => "invitation_sent",
            Self::EvaluationUpdated { .. } => "evaluation_updated",
            Self::Deleted { .. } => "deleted",
        }
    }

    pub fn assessment_id(&self) -> &str {
        match self {
            Self::Created { assessment_id, .. }
            | Self::StatusChanged { assessment_id, .. }
            | Self::InvitationSent { assessment_id, .. }
            | Self::EvaluationUpdated { assessment_id, .. }
            | Self::Deleted { assessment_id } => assessment_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_changed_serializes_with_tag() {
        let event = AssessmentEvent::StatusChanged {
            assessment_id: "a1".into(),
            from: AssessmentStatus::Scheduled,
            to: AssessmentStatus::WaitingConfirmation,
            cause: TransitionCause::Invitation,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["to"], "WAITING_CONFIRMATION");
        assert_eq!(json["cause"], "invitation");
        assert_eq!(json["type"], event.kind());
    }

    #[test]
    fn kind_matches_the_serialized_tag() {
        let events = [
            AssessmentEvent::Created {
                assessment_id: "a1".into(),
                participant_id: None,
            },
            AssessmentEvent::InvitationSent {
                assessment_id: "a1".into(),
                recipient: "6281234567892".into(),
            },
            AssessmentEvent::EvaluationUpdated {
                assessment_id: "a1".into(),
                evaluation_id: "e1".into(),
                status: EvaluationStatus::Completed,
            },
            AssessmentEvent::Deleted {
                assessment_id: "a1".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }
}
