//! The single writer of assessment status

use rusqlite::Connection;
use tracing::debug;

use super::transitions::{self, Command, EvaluationProgress, TransitionCause};
use crate::error::{Error, Result};
use crate::model::AssessmentStatus;
use crate::store::{assessments, evaluations};

/// A committed status write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub assessment_id: String,
    pub from: AssessmentStatus,
    pub to: AssessmentStatus,
    pub cause: TransitionCause,
}

/// Apply `command` to assessment `id` inside the caller's transaction.
///
/// Guards are evaluated against the stored row and the write is a
/// compare-and-swap on the status that was read, so a concurrent writer makes
/// this fail with `Conflict` instead of being overwritten. Returns `None` when
/// the status is unchanged or a [`Command::Propagate`] was not applicable.
pub(crate) fn apply(
    conn: &Connection,
    id: &str,
    command: Command,
    cause: TransitionCause,
) -> Result<Option<StatusChange>> {
    let from = assessments::require(conn, id)?.status;
    apply_from(conn, id, from, command, cause)
}

/// [`apply`] against the status `from` the caller observed
fn apply_from(
    conn: &Connection,
    id: &str,
    from: AssessmentStatus,
    command: Command,
    cause: TransitionCause,
) -> Result<Option<StatusChange>> {
    let to = command.target();

    if let Command::Propagate(_) = command {
        if from == to {
            return Ok(None);
        }
        if !transitions::is_allowed(from, to) {
            debug!(assessment_id = %id, %from, %to, "Skipping propagated status change");
            return Ok(None);
        }
    }

    let progress = if command.guards().iter().any(|g| g.needs_progress()) {
        let (total, pending) = evaluations::progress(conn, id)?;
        EvaluationProgress { total, pending }
    } else {
        EvaluationProgress::default()
    };
    transitions::check(&command, from, &progress)?;

    if from == to {
        return Ok(None);
    }

    if !assessments::compare_and_set_status(conn, id, from, to)? {
        return Err(Error::Conflict(format!(
            "Assessment {id} was modified concurrently; retry the request"
        )));
    }

    Ok(Some(StatusChange {
        assessment_id: id.to_string(),
        from,
        to,
        cause,
    }))
}
