//! Transition table and the command set that moves assessments through it
//!
//! Every status write in the crate is expressed as a [`Command`]. A command
//! names its target and the [`Guard`]s that must hold before the write; the
//! state machine evaluates those guards against the stored row, so there is
//! exactly one code path that mutates assessment status.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::AssessmentStatus;

use AssessmentStatus::*;

/// Statuses reachable from `from` through an ordinary transition request
pub fn allowed_targets(from: AssessmentStatus) -> &'static [AssessmentStatus] {
    match from {
        Created => &[Scheduled, Canceled],
        Scheduled => &[WaitingConfirmation, Reschedule, Canceled],
        WaitingConfirmation => &[TalentRequirements, Reschedule, Canceled],
        TalentRequirements => &[ReadyForAssessment, Reschedule, Canceled],
        ReadyForAssessment => &[Evaluating, Reschedule, Canceled],
        Evaluating => &[NeedReview, Canceled],
        NeedReview => &[Done, Evaluating, Canceled],
        Done => &[],
        Canceled => &[Created],
        Reschedule => &[Scheduled],
    }
}

pub fn is_allowed(from: AssessmentStatus, to: AssessmentStatus) -> bool {
    allowed_targets(from).contains(&to)
}

/// Privileged entry points that skip part of the ordinary guard set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Jump straight to `EVALUATING` from anywhere except `DONE`, skipping
    /// the table and the evaluator guard
    StartEvaluation,
    /// Back to `SCHEDULED` from anywhere except `DONE`
    ResetToScheduled,
}

/// A requested status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ordinary move along the transition table
    Transition(AssessmentStatus),
    Override(Override),
    /// Status derived from a requirement submission
    Submission(AssessmentStatus),
    /// Follow-up move triggered by another record; skipped when not legal
    Propagate(AssessmentStatus),
}

impl Command {
    pub fn target(&self) -> AssessmentStatus {
        match self {
            Self::Transition(to) | Self::Submission(to) | Self::Propagate(to) => *to,
            Self::Override(Override::StartEvaluation) => Evaluating,
            Self::Override(Override::ResetToScheduled) => Scheduled,
        }
    }

    /// Guards checked before the write, in order
    pub fn guards(&self) -> Vec<Guard> {
        match self {
            Self::Transition(to) => {
                let mut guards = vec![Guard::TransitionTable];
                match to {
                    Evaluating => guards.push(Guard::EvaluatorsAssigned),
                    Done => guards.push(Guard::EvaluationsCompleted),
                    _ => {}
                }
                guards
            }
            Self::Override(_) => vec![Guard::NotTerminal],
            Self::Submission(_) => vec![Guard::NotFinalized],
            Self::Propagate(_) => vec![Guard::TransitionTable],
        }
    }
}

/// Why a status changed, carried on lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    Request,
    Invitation,
    StartEvaluation,
    Reset,
    Submission,
    EvaluationCompleted,
}

/// Facts about an assessment's evaluations consulted by the guards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationProgress {
    pub total: usize,
    pub pending: usize,
}

/// A precondition on a status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Target must be listed in [`allowed_targets`] for the current status
    TransitionTable,
    /// At least one evaluation is attached
    EvaluatorsAssigned,
    /// Every attached evaluation is completed
    EvaluationsCompleted,
    /// Current status is neither `DONE` nor `CANCELED`
    NotFinalized,
    /// Current status is not `DONE`
    NotTerminal,
}

impl Guard {
    pub fn needs_progress(&self) -> bool {
        matches!(self, Self::EvaluatorsAssigned | Self::EvaluationsCompleted)
    }

    pub fn check(
        &self,
        from: AssessmentStatus,
        to: AssessmentStatus,
        progress: &EvaluationProgress,
    ) -> Result<()> {
        match self {
            Self::TransitionTable if !is_allowed(from, to) => {
                Err(Error::InvalidTransition { from, to })
            }
            Self::EvaluatorsAssigned if progress.total == 0 => Err(Error::PreconditionFailed(
                "Cannot move to EVALUATING status without evaluators".into(),
            )),
            Self::EvaluationsCompleted if progress.pending > 0 => {
                Err(Error::PreconditionFailed(format!(
                    "Cannot mark as DONE: {} pending evaluations",
                    progress.pending
                )))
            }
            Self::NotFinalized if from.is_finalized() => Err(Error::PreconditionFailed(format!(
                "Cannot update assessment in {from} status"
            ))),
            Self::NotTerminal if from == Done => Err(Error::InvalidTransition { from, to }),
            _ => Ok(()),
        }
    }
}

/// Run every guard of `command` for a move out of `from`
pub fn check(
    command: &Command,
    from: AssessmentStatus,
    progress: &EvaluationProgress,
) -> Result<()> {
    let to = command.target();
    command
        .guards()
        .iter()
        .try_for_each(|guard| guard.check(from, to, progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn assigned(total: usize, pending: usize) -> EvaluationProgress {
        EvaluationProgress { total, pending }
    }

    #[test]
    fn done_is_terminal() {
        assert!(allowed_targets(Done).is_empty());
    }

    #[test]
    fn cancel_edges() {
        for from in AssessmentStatus::ALL {
            let expected = !matches!(from, Done | Canceled | Reschedule);
            assert_eq!(is_allowed(from, Canceled), expected, "from {from}");
        }
        assert_eq!(allowed_targets(Canceled), &[Created]);
    }

    #[test]
    fn every_illegal_pair_is_an_invalid_transition() {
        let progress = assigned(2, 0);
        for from in AssessmentStatus::ALL {
            for to in AssessmentStatus::ALL {
                let result = check(&Command::Transition(to), from, &progress);
                if is_allowed(from, to) {
                    assert!(result.is_ok(), "{from} -> {to} should be legal");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::InvalidTransition, "{from} -> {to}");
                }
            }
        }
    }

    #[test]
    fn evaluating_requires_evaluators() {
        let err = check(&Command::Transition(Evaluating), ReadyForAssessment, &assigned(0, 0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(check(&Command::Transition(Evaluating), NeedReview, &assigned(1, 1)).is_ok());
    }

    #[test]
    fn done_requires_all_evaluations_completed() {
        let err = check(&Command::Transition(Done), NeedReview, &assigned(2, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(err.to_string().contains("1 pending"));
        assert!(check(&Command::Transition(Done), NeedReview, &assigned(2, 0)).is_ok());
    }

    #[test]
    fn table_is_checked_before_evaluation_guards() {
        let err = check(&Command::Transition(Done), Created, &assigned(1, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn start_evaluation_skips_all_but_the_terminal_guard() {
        let command = Command::Override(Override::StartEvaluation);
        for from in AssessmentStatus::ALL {
            let result = check(&command, from, &assigned(0, 0));
            if from == Done {
                assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidTransition);
            } else {
                assert!(result.is_ok(), "from {from}");
            }
        }
    }

    #[test]
    fn reset_is_refused_only_from_done() {
        let command = Command::Override(Override::ResetToScheduled);
        for from in AssessmentStatus::ALL {
            assert_eq!(check(&command, from, &assigned(0, 0)).is_ok(), from != Done);
        }
    }

    #[test]
    fn submission_is_refused_once_finalized() {
        for from in AssessmentStatus::ALL {
            let result = check(&Command::Submission(TalentRequirements), from, &assigned(0, 0));
            if from.is_finalized() {
                assert_eq!(result.unwrap_err().kind(), ErrorKind::PreconditionFailed);
            } else {
                assert!(result.is_ok(), "from {from}");
            }
        }
    }

    #[test]
    fn only_table_guards_read_progress() {
        assert!(!Guard::TransitionTable.needs_progress());
        assert!(Guard::EvaluatorsAssigned.needs_progress());
        assert!(Guard::EvaluationsCompleted.needs_progress());
    }
}
