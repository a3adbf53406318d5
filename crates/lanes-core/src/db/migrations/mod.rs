//! Board schema steps, tracked by `PRAGMA user_version`.
//!
//! `board_meta.schema_version` is kept equal to `user_version` so the
//! version is visible to tools that only read tables.

use super::schema;
use rusqlite::{Connection, types::Type};
use tracing::info;

/// One schema step.
struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Step {
        version: 2,
        name: "ordering indexes",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Schema version a freshly migrated board reports.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// Schema version recorded in the database file.
///
/// # Errors
///
/// Fails if the pragma cannot be read or holds a negative value.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(version).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(error))
    })
}

/// Bring the board schema up to [`LATEST_SCHEMA_VERSION`] and return the
/// version it ends at. A step and its version bump commit together.
///
/// # Errors
///
/// Fails on the first step that SQLite rejects; earlier steps stay applied.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let start = current_schema_version(conn)?;
    let pending = STEPS.iter().filter(|step| step.version > start);

    let mut reached = start;
    for step in pending {
        let version = i64::from(step.version);
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.execute(
            "UPDATE board_meta SET schema_version = ?1 WHERE id = 1",
            [version],
        )?;
        tx.commit()?;
        info!(version = step.version, step = step.name, "board schema step applied");
        reached = step.version;
    }
    Ok(reached)
}

#[cfg(test)]
mod tests {
    use super::{LATEST_SCHEMA_VERSION, current_schema_version, migrate};
    use crate::db::schema;
    use rusqlite::{Connection, params};

    fn sqlite_object_exists(
        conn: &Connection,
        object_type: &str,
        object_name: &str,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            )",
            params![object_type, object_name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(super::STEPS.last().map(|s| s.version), Some(LATEST_SCHEMA_VERSION));
        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        assert!(sqlite_object_exists(&conn, "table", "projects")?);
        assert!(sqlite_object_exists(&conn, "table", "tasks")?);
        assert!(sqlite_object_exists(&conn, "table", "board_meta")?);

        for index in schema::REQUIRED_INDEXES {
            assert!(
                sqlite_object_exists(&conn, "index", index)?,
                "missing expected index {index}"
            );
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let meta_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM board_meta", [], |row| row.get(0))?;
        assert_eq!(meta_rows, 1);

        let schema_version: i64 = conn.query_row(
            "SELECT schema_version FROM board_meta WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(schema_version, i64::from(LATEST_SCHEMA_VERSION));

        Ok(())
    }

    #[test]
    fn migrate_upgrades_from_v1_keeping_rows() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        conn.execute_batch(schema::MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", 1_i64)?;
        conn.execute(
            "INSERT INTO projects (project_id, title, position, created_at_ms)
             VALUES ('p1', 'Inbox', 1000.0, 1)",
            [],
        )?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let title: String = conn.query_row(
            "SELECT title FROM projects WHERE project_id = 'p1'",
            [],
            |row| row.get(0),
        )?;
        assert_eq!(title, "Inbox");
        assert!(sqlite_object_exists(&conn, "index", "idx_tasks_bucket_position")?);

        Ok(())
    }

    #[test]
    fn schema_rejects_blank_titles_and_bad_priorities() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrate(&mut conn)?;

        let blank = conn.execute(
            "INSERT INTO projects (project_id, title, position, created_at_ms)
             VALUES ('p1', '  ', 1000.0, 1)",
            [],
        );
        assert!(blank.is_err());

        conn.execute(
            "INSERT INTO projects (project_id, title, position, created_at_ms)
             VALUES ('p1', 'Inbox', 1000.0, 1)",
            [],
        )?;
        let bad_priority = conn.execute(
            "INSERT INTO tasks (task_id, project_id, title, priority, done, position, created_at_ms)
             VALUES ('t1', 'p1', 'x', 'urgent', 0, 1000.0, 1)",
            [],
        );
        assert!(bad_priority.is_err());

        Ok(())
    }
}
