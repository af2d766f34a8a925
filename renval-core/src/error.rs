//! Error types for renval-core

use thiserror::Error;

use crate::model::AssessmentStatus;

/// Result alias used throughout renval-core
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], used by the HTTP boundary to pick
/// a status code without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidTransition,
    PreconditionFailed,
    Forbidden,
    BadRequest,
    Validation,
    Dependency,
    Storage,
}

/// Top-level error type for renval-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AssessmentStatus,
        to: AssessmentStatus,
    },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Dependency(#[from] CollaboratorError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Dependency(_) => ErrorKind::Dependency,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return Self::Conflict("A record with this value already exists".into());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return Self::NotFound("Referenced record does not exist".into());
                }
                _ => {}
            }
        }
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("corrupt JSON payload: {err}"))
    }
}

/// Failures reported by external collaborators (artifact store, document
/// renderer, notification dispatcher)
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Artifact store failed: {0}")]
    Artifact(String),

    #[error("Artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("Failed to send notification: {0}")]
    Dispatch(String),

    #[error("Notification gateway rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Artifact(err.to_string())
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        Self::Dispatch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_displays_both_states() {
        let err = Error::InvalidTransition {
            from: AssessmentStatus::Done,
            to: AssessmentStatus::Created,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from DONE to CREATED"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn not_found_helper_formats_entity() {
        let err = Error::not_found("Assessment", "abc");
        assert_eq!(err.to_string(), "Assessment not found: abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn collaborator_error_converts_to_dependency() {
        let err: Error = CollaboratorError::Render("converter exited".into()).into();
        assert_eq!(err.kind(), ErrorKind::Dependency);
        assert!(err.to_string().contains("converter exited"));
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: Error = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn foreign_key_violation_maps_to_not_found() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY);
             CREATE TABLE child (id TEXT PRIMARY KEY, parent_id TEXT REFERENCES parent(id));",
        )
        .unwrap();
        let err: Error = conn
            .execute("INSERT INTO child VALUES ('c', 'missing')", [])
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
