//! `assessments` table

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};

use super::{enum_column, opt_json_column, opt_time_column, time_column, to_millis};
use crate::error::{Error, Result};
use crate::model::{
    ArtifactRef, Assessment, AssessmentQuery, AssessmentStatus, DeliveryMethod, ScheduleConflict,
};

/// Width of the window checked by the schedule conflict query
pub fn conflict_window() -> Duration {
    Duration::hours(2)
}

const COLUMNS: &str = "id, title, material, projection, method, room, meeting_link, \
     participant_id, schedule, expiry, status, attendance_confirmed, questionnaire_responses, \
     presentation_file, questionnaire_file, nota_dinas_file, is_active, created_at, updated_at";

fn row_to_assessment(row: &Row) -> rusqlite::Result<Assessment> {
    Ok(Assessment {
        id: row.get(0)?,
        title: row.get(1)?,
        material: row.get(2)?,
        projection: row.get(3)?,
        method: enum_column(row, 4, DeliveryMethod::parse)?,
        room: row.get(5)?,
        meeting_link: row.get(6)?,
        participant_id: row.get(7)?,
        schedule: opt_time_column(row, 8)?,
        expiry: opt_time_column(row, 9)?,
        status: enum_column(row, 10, AssessmentStatus::parse)?,
        attendance_confirmed: row.get(11)?,
        questionnaire_responses: opt_json_column(row, 12)?,
        presentation_file: row.get::<_, Option<String>>(13)?.map(ArtifactRef::new),
        questionnaire_file: row.get::<_, Option<String>>(14)?.map(ArtifactRef::new),
        nota_dinas_file: row.get::<_, Option<String>>(15)?.map(ArtifactRef::new),
        is_active: row.get(16)?,
        created_at: time_column(row, 17)?,
        updated_at: time_column(row, 18)?,
    })
}

fn answers_json(assessment: &Assessment) -> Result<Option<String>> {
    Ok(match &assessment.questionnaire_responses {
        Some(answers) => Some(serde_json::to_string(answers)?),
        None => None,
    })
}

pub(crate) fn insert(conn: &Connection, assessment: &Assessment) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO assessments ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            assessment.id,
            assessment.title,
            assessment.material,
            assessment.projection,
            assessment.method.as_str(),
            assessment.room,
            assessment.meeting_link,
            assessment.participant_id,
            assessment.schedule.as_ref().map(to_millis),
            assessment.expiry.as_ref().map(to_millis),
            assessment.status.as_str(),
            assessment.attendance_confirmed,
            answers_json(assessment)?,
            assessment.presentation_file.as_ref().map(ArtifactRef::as_str),
            assessment.questionnaire_file.as_ref().map(ArtifactRef::as_str),
            assessment.nota_dinas_file.as_ref().map(ArtifactRef::as_str),
            assessment.is_active,
            to_millis(&assessment.created_at),
            to_millis(&assessment.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn get(conn: &Connection, id: &str) -> Result<Option<Assessment>> {
    let assessment = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM assessments WHERE id = ?1"),
            [id],
            row_to_assessment,
        )
        .optional()?;
    Ok(assessment)
}

pub(crate) fn require(conn: &Connection, id: &str) -> Result<Assessment> {
    get(conn, id)?.ok_or_else(|| Error::not_found("Assessment", id))
}

/// Write every non-status column of an existing row.
///
/// Status is deliberately absent: it is only ever written through
/// [`compare_and_set_status`].
pub(crate) fn update_fields(conn: &Connection, assessment: &Assessment) -> Result<()> {
    let changed = conn.execute(
        "UPDATE assessments SET
            title = ?2, material = ?3, projection = ?4, method = ?5, room = ?6,
            meeting_link = ?7, participant_id = ?8, schedule = ?9, expiry = ?10,
            attendance_confirmed = ?11, questionnaire_responses = ?12,
            presentation_file = ?13, questionnaire_file = ?14, nota_dinas_file = ?15,
            is_active = ?16, updated_at = ?17
         WHERE id = ?1",
        params![
            assessment.id,
            assessment.title,
            assessment.material,
            assessment.projection,
            assessment.method.as_str(),
            assessment.room,
            assessment.meeting_link,
            assessment.participant_id,
            assessment.schedule.as_ref().map(to_millis),
            assessment.expiry.as_ref().map(to_millis),
            assessment.attendance_confirmed,
            answers_json(assessment)?,
            assessment.presentation_file.as_ref().map(ArtifactRef::as_str),
            assessment.questionnaire_file.as_ref().map(ArtifactRef::as_str),
            assessment.nota_dinas_file.as_ref().map(ArtifactRef::as_str),
            assessment.is_active,
            to_millis(&Utc::now()),
        ],
    )?;
    if changed == 0 {
        return Err(Error::not_found("Assessment", &assessment.id));
    }
    Ok(())
}

/// Move `id` from `expected` to `next`; returns false when another writer
/// changed the status first.
pub(crate) fn compare_and_set_status(
    conn: &Connection,
    id: &str,
    expected: AssessmentStatus,
    next: AssessmentStatus,
) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE assessments SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        params![id, expected.as_str(), next.as_str(), to_millis(&Utc::now())],
    )?;
    Ok(changed == 1)
}

pub(crate) fn delete(conn: &Connection, id: &str) -> Result<()> {
    conn.execute("DELETE FROM assessments WHERE id = ?1", [id])?;
    Ok(())
}

/// Build the shared WHERE clause for list and count queries
fn filter_clause(query: &AssessmentQuery) -> (String, Vec<Box<dyn ToSql>>) {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();

    if !query.include_inactive {
        conditions.push("a.is_active = 1".to_string());
    }

    if let Some(status) = query.status {
        conditions.push(format!("a.status = ?{}", params.len() + 1));
        params.push(Box::new(status.as_str()));
    }

    if let Some(method) = query.method {
        conditions.push(format!("a.method = ?{}", params.len() + 1));
        params.push(Box::new(method.as_str()));
    }

    if let Some(ref participant) = query.participant_id {
        conditions.push(format!("a.participant_id = ?{}", params.len() + 1));
        params.push(Box::new(participant.clone()));
    }

    if let Some(ref evaluator) = query.evaluator_id {
        conditions.push(format!(
            "a.id IN (SELECT e.assessment_id FROM evaluations e WHERE e.evaluator_id = ?{})",
            params.len() + 1
        ));
        params.push(Box::new(evaluator.clone()));
    }

    if let Some(ref search) = query.search {
        let idx = params.len() + 1;
        conditions.push(format!(
            "(a.title LIKE ?{idx} OR a.material LIKE ?{idx} OR a.projection LIKE ?{idx})"
        ));
        params.push(Box::new(format!("%{}%", search)));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, params)
}

/// One page of matching assessments (newest first) and the total match count
pub(crate) fn list(conn: &Connection, query: &AssessmentQuery) -> Result<(Vec<Assessment>, u32)> {
    let (where_clause, mut params) = filter_clause(query);

    let total: u32 = {
        let sql = format!("SELECT COUNT(*) FROM assessments a {where_clause}");
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.query_row(&sql, refs.as_slice(), |row| row.get(0))?
    };

    let sql = format!(
        "SELECT {} FROM assessments a {where_clause}
         ORDER BY a.created_at DESC, a.id LIMIT ?{} OFFSET ?{}",
        COLUMNS
            .split(", ")
            .map(|c| format!("a.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", "),
        params.len() + 1,
        params.len() + 2
    );
    params.push(Box::new(query.effective_limit()));
    params.push(Box::new(query.offset()));

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), row_to_assessment)?;
    Ok((rows.collect::<Result<Vec<_>, _>>()?, total))
}

/// Active assessments involving `person_id` scheduled within
/// [`conflict_window`] after `schedule`
pub(crate) fn schedule_conflicts(
    conn: &Connection,
    person_id: &str,
    schedule: DateTime<Utc>,
    exclude: Option<&str>,
) -> Result<Vec<ScheduleConflict>> {
    let start = to_millis(&schedule);
    let end = to_millis(&(schedule + conflict_window()));
    let mut stmt = conn.prepare(
        "SELECT a.id, a.title, a.schedule, a.status FROM assessments a
         WHERE (a.participant_id = ?1
                OR a.id IN (SELECT p.assessment_id FROM assessment_participants p
                            WHERE p.person_id = ?1))
           AND a.schedule BETWEEN ?2 AND ?3
           AND a.status NOT IN ('CANCELED', 'DONE')
           AND (?4 IS NULL OR a.id <> ?4)
         ORDER BY a.schedule",
    )?;
    let rows = stmt.query_map(params![person_id, start, end, exclude], |row| {
        Ok(ScheduleConflict {
            id: row.get(0)?,
            title: row.get(1)?,
            schedule: time_column(row, 2)?,
            status: enum_column(row, 3, AssessmentStatus::parse)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
