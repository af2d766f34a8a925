//! Closed status and role sets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an assessment
///
/// Participant links with role `PARTICIPANT` reuse the same set for their
/// individual status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Created,
    Scheduled,
    WaitingConfirmation,
    TalentRequirements,
    ReadyForAssessment,
    Evaluating,
    NeedReview,
    Done,
    Canceled,
    Reschedule,
}

impl AssessmentStatus {
    pub const ALL: [Self; 10] = [
        Self::Created,
        Self::Scheduled,
        Self::WaitingConfirmation,
        Self::TalentRequirements,
        Self::ReadyForAssessment,
        Self::Evaluating,
        Self::NeedReview,
        Self::Done,
        Self::Canceled,
        Self::Reschedule,
    ];

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Scheduled => "SCHEDULED",
            Self::WaitingConfirmation => "WAITING_CONFIRMATION",
            Self::TalentRequirements => "TALENT_REQUIREMENTS",
            Self::ReadyForAssessment => "READY_FOR_ASSESSMENT",
            Self::Evaluating => "EVALUATING",
            Self::NeedReview => "NEED_REVIEW",
            Self::Done => "DONE",
            Self::Canceled => "CANCELED",
            Self::Reschedule => "RESCHEDULE",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Finalized or terminated assessments accept no further edits
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Done | Self::Canceled)
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an assessment is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    /// In person
    Offline,
    /// Remote
    Online,
    Hybrid,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "OFFLINE",
            Self::Online => "ONLINE",
            Self::Hybrid => "HYBRID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OFFLINE" => Some(Self::Offline),
            "ONLINE" => Some(Self::Online),
            "HYBRID" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

/// Progress of one evaluator's scoring work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a person attached to an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Participant,
    Evaluator,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Participant => "PARTICIPANT",
            Self::Evaluator => "EVALUATOR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PARTICIPANT" => Some(Self::Participant),
            "EVALUATOR" => Some(Self::Evaluator),
            _ => None,
        }
    }

    /// Row id of the seeded `assessment_roles` entry
    pub fn role_id(&self) -> i64 {
        match self {
            Self::Participant => 1,
            Self::Evaluator => 2,
        }
    }
}

/// System-wide role of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    Administrator,
    #[default]
    User,
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "ADMINISTRATOR",
            Self::User => "USER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMINISTRATOR" => Some(Self::Administrator),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}
