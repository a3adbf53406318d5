//! On-disk board: one SQLite file under `.lanes/`.
//!
//! Every connection runs with foreign keys on (project deletes cascade),
//! WAL journaling, `synchronous = NORMAL`, and a 5 second busy timeout.

pub mod migrations;
pub mod query;
pub mod remote;
pub mod schema;

pub use remote::SqliteRemote;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the board file at `path`, creating it and its directory if needed,
/// and migrate it.
///
/// # Errors
///
/// Fails if the directory or file cannot be created, or if a pragma or
/// schema step is rejected.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create board db directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open board database {}", path.display()))?;

    apply_pragmas(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply board migrations")?;

    Ok(conn)
}

/// Scratch board for tests and dry runs; nothing is written to disk.
///
/// # Errors
///
/// Fails if a schema step is rejected.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory board")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply board migrations")?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    for (pragma, value) in [("foreign_keys", "ON"), ("synchronous", "NORMAL")] {
        conn.pragma_update(None, pragma, value)?;
    }
    // journal_mode answers with the mode it switched to.
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    tracing::debug!(%mode, "board journal mode");
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
}
