//! `evaluations` and `evaluation_files` tables

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use uuid::Uuid;

use super::{enum_column, json_column, time_column, to_millis};
use crate::error::{Error, Result};
use crate::model::{ArtifactRef, Evaluation, EvaluationQuery, EvaluationStatus};

const SELECT: &str = "SELECT e.id, e.assessment_id, e.evaluator_id, e.scores, e.recommendation, \
     e.status, f.artifact, e.created_at, e.updated_at
     FROM evaluations e LEFT JOIN evaluation_files f ON f.evaluation_id = e.id";

fn row_to_evaluation(row: &Row) -> rusqlite::Result<Evaluation> {
    Ok(Evaluation {
        id: row.get(0)?,
        assessment_id: row.get(1)?,
        evaluator_id: row.get(2)?,
        scores: json_column(row, 3)?,
        recommendation: row.get(4)?,
        status: enum_column(row, 5, EvaluationStatus::parse)?,
        artifact: row.get::<_, Option<String>>(6)?.map(ArtifactRef::new),
        created_at: time_column(row, 7)?,
        updated_at: time_column(row, 8)?,
    })
}

pub(crate) fn insert(conn: &Connection, evaluation: &Evaluation) -> Result<()> {
    conn.execute(
        "INSERT INTO evaluations
            (id, assessment_id, evaluator_id, scores, recommendation, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            evaluation.id,
            evaluation.assessment_id,
            evaluation.evaluator_id,
            serde_json::to_string(&evaluation.scores)?,
            evaluation.recommendation,
            evaluation.status.as_str(),
            to_millis(&evaluation.created_at),
            to_millis(&evaluation.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn get(conn: &Connection, id: &str) -> Result<Option<Evaluation>> {
    let evaluation = conn
        .query_row(&format!("{SELECT} WHERE e.id = ?1"), [id], row_to_evaluation)
        .optional()?;
    Ok(evaluation)
}

pub(crate) fn require(conn: &Connection, id: &str) -> Result<Evaluation> {
    get(conn, id)?.ok_or_else(|| Error::not_found("Evaluation", id))
}

pub(crate) fn find(
    conn: &Connection,
    assessment_id: &str,
    evaluator_id: &str,
) -> Result<Option<Evaluation>> {
    let evaluation = conn
        .query_row(
            &format!("{SELECT} WHERE e.assessment_id = ?1 AND e.evaluator_id = ?2"),
            [assessment_id, evaluator_id],
            row_to_evaluation,
        )
        .optional()?;
    Ok(evaluation)
}

pub(crate) fn list(conn: &Connection, query: &EvaluationQuery) -> Result<Vec<Evaluation>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = query.status {
        conditions.push(format!("e.status = ?{}", params.len() + 1));
        params.push(Box::new(status.as_str()));
    }
    if let Some(ref assessment) = query.assessment_id {
        conditions.push(format!("e.assessment_id = ?{}", params.len() + 1));
        params.push(Box::new(assessment.clone()));
    }
    if let Some(ref evaluator) = query.evaluator_id {
        conditions.push(format!("e.evaluator_id = ?{}", params.len() + 1));
        params.push(Box::new(evaluator.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let mut stmt = conn.prepare(&format!("{SELECT} {where_clause} ORDER BY e.created_at, e.id"))?;
    let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), row_to_evaluation)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn list_for_assessment(conn: &Connection, assessment_id: &str) -> Result<Vec<Evaluation>> {
    list(
        conn,
        &EvaluationQuery {
            assessment_id: Some(assessment_id.to_string()),
            ..Default::default()
        },
    )
}

/// Number of evaluations attached and how many of them are not completed
pub(crate) fn progress(conn: &Connection, assessment_id: &str) -> Result<(usize, usize)> {
    let (total, pending): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status <> 'COMPLETED' THEN 1 ELSE 0 END), 0)
         FROM evaluations WHERE assessment_id = ?1",
        [assessment_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((total as usize, pending as usize))
}

pub(crate) fn update(conn: &Connection, evaluation: &Evaluation) -> Result<()> {
    conn.execute(
        "UPDATE evaluations SET scores = ?2, recommendation = ?3, status = ?4, updated_at = ?5
         WHERE id = ?1",
        params![
            evaluation.id,
            serde_json::to_string(&evaluation.scores)?,
            evaluation.recommendation,
            evaluation.status.as_str(),
            to_millis(&evaluation.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM evaluation_files WHERE evaluation_id = ?1", [id])?;
    conn.execute("DELETE FROM evaluations WHERE id = ?1", [id])?;
    Ok(())
}

/// Delete every evaluation of an assessment together with its file records,
/// returning the artifacts those records referenced
pub(crate) fn delete_for_assessment(
    conn: &Connection,
    assessment_id: &str,
) -> Result<Vec<ArtifactRef>> {
    let artifacts = {
        let mut stmt = conn.prepare(
            "SELECT f.artifact FROM evaluation_files f
             JOIN evaluations e ON e.id = f.evaluation_id
             WHERE e.assessment_id = ?1",
        )?;
        let rows = stmt.query_map([assessment_id], |row| row.get::<_, String>(0))?;
        rows.map(|r| r.map(ArtifactRef::new))
            .collect::<Result<Vec<_>, _>>()?
    };
    conn.execute(
        "DELETE FROM evaluation_files WHERE evaluation_id IN
            (SELECT id FROM evaluations WHERE assessment_id = ?1)",
        [assessment_id],
    )?;
    conn.execute("DELETE FROM evaluations WHERE assessment_id = ?1", [assessment_id])?;
    Ok(artifacts)
}

/// Remove the file record of an evaluation, returning what it referenced
pub(crate) fn take_file(conn: &Connection, evaluation_id: &str) -> Result<Option<ArtifactRef>> {
    let artifact: Option<String> = conn
        .query_row(
            "SELECT artifact FROM evaluation_files WHERE evaluation_id = ?1",
            [evaluation_id],
            |row| row.get(0),
        )
        .optional()?;
    if artifact.is_some() {
        conn.execute(
            "DELETE FROM evaluation_files WHERE evaluation_id = ?1",
            [evaluation_id],
        )?;
    }
    Ok(artifact.map(ArtifactRef::new))
}

pub(crate) fn attach_file(
    conn: &Connection,
    evaluation_id: &str,
    artifact: &ArtifactRef,
) -> Result<()> {
    conn.execute(
        "INSERT INTO evaluation_files (id, evaluation_id, file_name, artifact, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            evaluation_id,
            artifact.file_name(),
            artifact.as_str(),
            to_millis(&Utc::now()),
        ],
    )?;
    Ok(())
}
