//! `people` table

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use super::{enum_column, time_column, to_millis};
use crate::error::Result;
use crate::model::{NewPerson, Person, SystemRole};

const COLUMNS: &str =
    "id, name, email, phone, nip, position, division, system_role, created_at";

fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        nip: row.get(4)?,
        position: row.get(5)?,
        division: row.get(6)?,
        system_role: enum_column(row, 7, SystemRole::parse)?,
        created_at: time_column(row, 8)?,
    })
}

pub(crate) fn insert(conn: &Connection, person: NewPerson) -> Result<Person> {
    let person = Person {
        id: Uuid::new_v4().to_string(),
        name: person.name,
        email: person.email,
        phone: person.phone,
        nip: person.nip,
        position: person.position,
        division: person.division,
        system_role: person.system_role,
        created_at: Utc::now(),
    };
    conn.execute(
        &format!("INSERT INTO people ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            person.id,
            person.name,
            person.email,
            person.phone,
            person.nip,
            person.position,
            person.division,
            person.system_role.as_str(),
            to_millis(&person.created_at),
        ],
    )?;
    Ok(person)
}

pub(crate) fn get(conn: &Connection, id: &str) -> Result<Option<Person>> {
    let person = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM people WHERE id = ?1"),
            [id],
            row_to_person,
        )
        .optional()?;
    Ok(person)
}

pub(crate) fn exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM people WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn list(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM people ORDER BY name"))?;
    let rows = stmt.query_map([], row_to_person)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
