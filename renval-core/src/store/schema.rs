//! Database schema, stamped into `PRAGMA user_version`

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Version stamped once [`SCHEMA`] is in place
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = include_str!("schema.sql");

/// Brings a connection's database up to [`SCHEMA_VERSION`]
pub struct Migrator<'a> {
    conn: &'a Connection,
}

impl<'a> Migrator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Version stamped in the database file; 0 for an empty one
    pub fn current_version(&self) -> Result<i32> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    /// Create the schema on an empty database. A database stamped by a newer
    /// build is refused rather than opened.
    pub fn migrate(&self) -> Result<()> {
        match self.current_version()? {
            0 => {
                let tx = self.conn.unchecked_transaction()?;
                tx.execute_batch(SCHEMA)
                    .map_err(|e| Error::Storage(format!("schema creation failed: {e}")))?;
                tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
                tx.commit()?;
                info!(version = SCHEMA_VERSION, "Created database schema");
                Ok(())
            }
            SCHEMA_VERSION => {
                debug!(version = SCHEMA_VERSION, "Database schema is current");
                Ok(())
            }
            found => Err(Error::Storage(format!(
                "database schema version {found} is newer than supported version {SCHEMA_VERSION}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn empty_database_gets_every_table() {
        let conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&conn);
        assert_eq!(migrator.current_version().unwrap(), 0);

        migrator.migrate().unwrap();

        assert_eq!(migrator.current_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(
            tables(&conn),
            vec![
                "assessment_participants",
                "assessment_roles",
                "assessments",
                "evaluation_files",
                "evaluations",
                "people",
            ]
        );
    }

    #[test]
    fn current_schema_is_left_alone() {
        let conn = Connection::open_in_memory().unwrap();
        Migrator::new(&conn).migrate().unwrap();
        conn.execute("DELETE FROM assessment_roles WHERE name = 'EVALUATOR'", [])
            .unwrap();

        Migrator::new(&conn).migrate().unwrap();

        let roles: i64 = conn
            .query_row("SELECT COUNT(*) FROM assessment_roles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(roles, 1);
    }

    #[test]
    fn newer_database_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = Migrator::new(&conn).migrate().unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "{err:?}");
        assert!(tables(&conn).is_empty());
    }

    #[test]
    fn roles_are_seeded() {
        let conn = Connection::open_in_memory().unwrap();
        Migrator::new(&conn).migrate().unwrap();

        let names: Vec<String> = conn
            .prepare("SELECT name FROM assessment_roles ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(names, vec!["PARTICIPANT", "EVALUATOR"]);
    }
}
