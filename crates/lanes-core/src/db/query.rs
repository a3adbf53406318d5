//! `SQLite` query helpers for the board database.
//!
//! Every function maps rows to the domain types in [`crate::model`] and
//! returns `anyhow::Result<T>`. Lists are ordered by `position` with `rowid`
//! as the tie-breaker, so equal positions keep insertion order.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, types::Type};
use std::path::Path;

use crate::model::{BoardData, Priority, Project, ProjectPatch, Task, TaskPatch};

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

const PROJECT_COLUMNS: &str = "project_id, title, position, created_at_ms";

const TASK_COLUMNS: &str = "task_id, project_id, title, description, priority, done, \
     position, created_at_ms, completed_at_ms";

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        position: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority: String = row.get(4)?;
    let priority = priority
        .parse::<Priority>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority,
        done: row.get::<_, i64>(5)? != 0,
        position: row.get(6)?,
        created_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Try to open an existing board database read/write.
///
/// Returns `Ok(None)` if the file does not exist, or if it exists but cannot
/// be opened or migrated. Callers treat `None` as "run `lanes init`".
///
/// # Errors
///
/// Only fails for unexpected filesystem errors while probing `path`.
pub fn try_open_store(path: &Path) -> Result<Option<Connection>> {
    if !path
        .try_exists()
        .with_context(|| format!("inspect board database {}", path.display()))?
    {
        return Ok(None);
    }

    match super::open_store(path) {
        Ok(conn) => Ok(Some(conn)),
        Err(e) => {
            tracing::warn!(path = %path.display(), "board database unusable: {e:#}");
            Ok(None)
        }
    }
}

/// All projects in board order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY position ASC, rowid ASC");
    let mut stmt = conn.prepare(&sql).context("prepare list_projects")?;
    let rows = stmt
        .query_map([], row_to_project)
        .context("execute list_projects")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read project rows")
}

/// All tasks grouped by project, each group in position order.
///
/// # Errors
///
/// Returns an error if the query fails or a row carries an unknown priority.
pub fn list_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks ORDER BY project_id ASC, position ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare list_tasks")?;
    let rows = stmt.query_map([], row_to_task).context("execute list_tasks")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("read task rows")
}

/// Load the whole board.
///
/// # Errors
///
/// Returns an error if either list query fails.
pub fn load_board(conn: &Connection) -> Result<BoardData> {
    Ok(BoardData::new(list_projects(conn)?, list_tasks(conn)?))
}

/// Fetch one project by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_project(conn: &Connection, id: &str) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1");
    conn.query_row(&sql, params![id], row_to_project)
        .optional()
        .with_context(|| format!("get project {id}"))
}

/// Fetch one task by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_task(conn: &Connection, id: &str) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1");
    conn.query_row(&sql, params![id], row_to_task)
        .optional()
        .with_context(|| format!("get task {id}"))
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

fn insert_project_row(conn: &Connection, project: &Project) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO projects (project_id, title, position, created_at_ms)
         VALUES (?1, ?2, ?3, ?4)",
        params![project.id, project.title, project.position, project.created_at],
    )?;
    Ok(())
}

fn insert_task_row(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, project_id, title, description, priority, done,
            position, created_at_ms, completed_at_ms
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            task.id,
            task.project_id,
            task.title,
            task.description,
            task.priority.as_str(),
            i64::from(task.done),
            task.position,
            task.created_at,
            task.completed_at,
        ],
    )?;
    Ok(())
}

/// Insert a new project row.
///
/// # Errors
///
/// Returns an error on a duplicate id or a constraint violation.
pub fn insert_project(conn: &Connection, project: &Project) -> Result<()> {
    insert_project_row(conn, project).with_context(|| format!("insert project {}", project.id))
}

/// Insert a new task row.
///
/// # Errors
///
/// Returns an error on a duplicate id, an unknown project, or a constraint
/// violation.
pub fn insert_task(conn: &Connection, task: &Task) -> Result<()> {
    insert_task_row(conn, task).with_context(|| format!("insert task {}", task.id))
}

/// Apply `patch` to a project and return the stored row.
///
/// # Errors
///
/// Returns an error if the read or write fails.
pub fn update_project(
    conn: &mut Connection,
    id: &str,
    patch: &ProjectPatch,
) -> Result<Option<Project>> {
    let tx = conn.transaction().context("begin update_project")?;
    let Some(mut project) = get_project(&tx, id)? else {
        return Ok(None);
    };
    patch.apply_to(&mut project);
    tx.execute(
        "UPDATE projects SET title = ?2, position = ?3 WHERE project_id = ?1",
        params![project.id, project.title, project.position],
    )
    .with_context(|| format!("update project {id}"))?;
    tx.commit().context("commit update_project")?;
    Ok(Some(project))
}

/// Apply `patch` to a task and return the stored row.
///
/// # Errors
///
/// Returns an error if the read or write fails.
pub fn update_task(conn: &mut Connection, id: &str, patch: &TaskPatch) -> Result<Option<Task>> {
    let tx = conn.transaction().context("begin update_task")?;
    let Some(mut task) = get_task(&tx, id)? else {
        return Ok(None);
    };
    patch.check_completion(&task)?;
    patch.apply_to(&mut task);
    tx.execute(
        "UPDATE tasks SET
            title = ?2, description = ?3, priority = ?4, done = ?5,
            position = ?6, completed_at_ms = ?7
         WHERE task_id = ?1",
        params![
            task.id,
            task.title,
            task.description,
            task.priority.as_str(),
            i64::from(task.done),
            task.position,
            task.completed_at,
        ],
    )
    .with_context(|| format!("update task {id}"))?;
    tx.commit().context("commit update_task")?;
    Ok(Some(task))
}

/// Delete a project; its tasks go with it through the foreign key cascade.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_project(conn: &Connection, id: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM projects WHERE project_id = ?1", params![id])
        .with_context(|| format!("delete project {id}"))?;
    Ok(removed > 0)
}

/// Delete a task.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_task(conn: &Connection, id: &str) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM tasks WHERE task_id = ?1", params![id])
        .with_context(|| format!("delete task {id}"))?;
    Ok(removed > 0)
}

fn replace_rows(tx: &Transaction<'_>, data: &BoardData) -> Result<()> {
    tx.execute("DELETE FROM tasks", [])
        .context("clear tasks")?;
    tx.execute("DELETE FROM projects", [])
        .context("clear projects")?;
    for project in &data.projects {
        insert_project(tx, project)?;
    }
    for task in &data.tasks {
        insert_task(tx, task)?;
    }
    Ok(())
}

/// Replace every project and task in one transaction and return what was
/// stored. On error nothing is committed.
///
/// # Errors
///
/// Returns an error if any row is rejected.
pub fn replace_all(conn: &mut Connection, data: &BoardData) -> Result<BoardData> {
    let tx = conn.transaction().context("begin replace_all")?;
    replace_rows(&tx, data)?;
    let stored = load_board(&tx)?;
    tx.commit().context("commit replace_all")?;
    Ok(stored)
}
