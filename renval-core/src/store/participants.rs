//! `assessment_participants` and `assessment_roles` tables

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{enum_column, opt_enum_column, opt_time_column, time_column, to_millis};
use crate::error::{Error, Result};
use crate::model::{AssessmentStatus, ParticipantLink, ParticipantRole};

const SELECT: &str = "SELECT p.id, p.assessment_id, p.person_id, r.name, p.status, p.schedule, \
     p.expiry, p.created_at
     FROM assessment_participants p JOIN assessment_roles r ON r.id = p.role_id";

fn row_to_link(row: &Row) -> rusqlite::Result<ParticipantLink> {
    Ok(ParticipantLink {
        id: row.get(0)?,
        assessment_id: row.get(1)?,
        person_id: row.get(2)?,
        role: enum_column(row, 3, ParticipantRole::parse)?,
        status: opt_enum_column(row, 4, AssessmentStatus::parse)?,
        schedule: opt_time_column(row, 5)?,
        expiry: opt_time_column(row, 6)?,
        created_at: time_column(row, 7)?,
    })
}

/// Resolve a role row id to its role
pub(crate) fn role(conn: &Connection, role_id: i64) -> Result<ParticipantRole> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM assessment_roles WHERE id = ?1",
            [role_id],
            |row| row.get(0),
        )
        .optional()?;
    name.as_deref()
        .and_then(ParticipantRole::parse)
        .ok_or_else(|| Error::NotFound("Assessment role not found".into()))
}

pub(crate) fn insert(conn: &Connection, link: &ParticipantLink) -> Result<()> {
    conn.execute(
        "INSERT INTO assessment_participants
            (id, assessment_id, person_id, role_id, status, schedule, expiry, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            link.id,
            link.assessment_id,
            link.person_id,
            link.role.role_id(),
            link.status.map(|s| s.as_str()),
            link.schedule.as_ref().map(to_millis),
            link.expiry.as_ref().map(to_millis),
            to_millis(&link.created_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn get(
    conn: &Connection,
    assessment_id: &str,
    link_id: &str,
) -> Result<Option<ParticipantLink>> {
    let link = conn
        .query_row(
            &format!("{SELECT} WHERE p.assessment_id = ?1 AND p.id = ?2"),
            [assessment_id, link_id],
            row_to_link,
        )
        .optional()?;
    Ok(link)
}

pub(crate) fn find_by_person(
    conn: &Connection,
    assessment_id: &str,
    person_id: &str,
) -> Result<Option<ParticipantLink>> {
    let link = conn
        .query_row(
            &format!("{SELECT} WHERE p.assessment_id = ?1 AND p.person_id = ?2"),
            [assessment_id, person_id],
            row_to_link,
        )
        .optional()?;
    Ok(link)
}

pub(crate) fn list_for_assessment(
    conn: &Connection,
    assessment_id: &str,
) -> Result<Vec<ParticipantLink>> {
    let mut stmt =
        conn.prepare(&format!("{SELECT} WHERE p.assessment_id = ?1 ORDER BY r.id, p.created_at"))?;
    let rows = stmt.query_map([assessment_id], row_to_link)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Persist the per-participant state of a link
pub(crate) fn update_state(conn: &Connection, link: &ParticipantLink) -> Result<()> {
    conn.execute(
        "UPDATE assessment_participants SET status = ?2, schedule = ?3, expiry = ?4 WHERE id = ?1",
        params![
            link.id,
            link.status.map(|s| s.as_str()),
            link.schedule.as_ref().map(to_millis),
            link.expiry.as_ref().map(to_millis),
        ],
    )?;
    Ok(())
}

pub(crate) fn delete(conn: &Connection, link_id: &str) -> Result<()> {
    conn.execute("DELETE FROM assessment_participants WHERE id = ?1", [link_id])?;
    Ok(())
}

pub(crate) fn delete_for_assessment(conn: &Connection, assessment_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM assessment_participants WHERE assessment_id = ?1",
        [assessment_id],
    )?;
    Ok(())
}
