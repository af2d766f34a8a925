//! SQLite persistence for assessments, participants, evaluations and people
//!
//! [`Store`] owns a single connection. Reads go through [`Store::read`];
//! every mutation runs inside [`Store::transaction`] so multi-row changes are
//! all-or-nothing. The per-table functions in the submodules take a plain
//! `&Connection` and are composed inside those closures by the services.

pub(crate) mod assessments;
pub(crate) mod detail;
pub(crate) mod evaluations;
mod schema;
pub(crate) mod participants;
pub(crate) mod people;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::model::{NewPerson, Person};

pub use schema::{Migrator, SCHEMA_VERSION};

/// SQLite-backed store
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create database at path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Migrator::new(&conn).migrate()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        self.read(|conn| Migrator::new(conn).current_version())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("store connection lock poisoned".into()))
    }

    /// Run a read-only closure against the connection
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run a closure inside one immediate transaction.
    ///
    /// The transaction commits only when the closure returns `Ok`; any error
    /// rolls back every statement it executed.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn insert_person(&self, person: NewPerson) -> Result<Person> {
        person.validate()?;
        self.transaction(|tx| people::insert(tx, person))
    }

    pub fn get_person(&self, id: &str) -> Result<Person> {
        self.read(|conn| people::get(conn, id)?.ok_or_else(|| Error::not_found("Person", id)))
    }

    pub fn list_people(&self) -> Result<Vec<Person>> {
        self.read(people::list)
    }
}

pub(crate) fn to_millis(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

pub(crate) fn time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(from_millis(row.get(idx)?))
}

pub(crate) fn opt_time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(from_millis))
}

/// Decode a closed-set enum stored as text
pub(crate) fn enum_column<T>(
    row: &Row,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unknown value {raw:?}")))
}

pub(crate) fn opt_enum_column<T>(
    row: &Row,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| conversion_error(idx, format!("unknown value {raw:?}"))),
        None => Ok(None),
    }
}

/// Decode a JSON document stored as text
pub(crate) fn json_column<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e.to_string()))
}

pub(crate) fn opt_json_column<T: DeserializeOwned>(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, e.to_string())),
        None => Ok(None),
    }
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
