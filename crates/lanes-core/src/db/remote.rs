//! [`Remote`] backed by the SQLite board database.

use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::query;
use crate::error::{RemoteError, ValidationError};
use crate::model::{BoardData, Project, ProjectPatch, Task, TaskPatch};
use crate::remote::Remote;

/// Durable board store. Owns one connection; the sync worker is its only user.
#[derive(Debug)]
pub struct SqliteRemote {
    conn: Connection,
    path: Option<PathBuf>,
}

fn rejected(err: &ValidationError) -> RemoteError {
    RemoteError::Rejected(err.to_string())
}

impl SqliteRemote {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = super::open_store(path)?;
        debug!(path = %path.display(), "opened sqlite remote");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: super::open_in_memory()?,
            path: None,
        })
    }

    /// File backing this store, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read access for diagnostics.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Remote for SqliteRemote {
    #[instrument(level = "trace", skip(self))]
    fn get_all(&mut self) -> Result<BoardData, RemoteError> {
        Ok(query::load_board(&self.conn)?)
    }

    #[instrument(level = "trace", skip(self, project), fields(id = %project.id))]
    fn create_project(&mut self, project: Project) -> Result<Project, RemoteError> {
        project.validate().map_err(|e| rejected(&e))?;
        query::insert_project(&self.conn, &project)?;
        Ok(project)
    }

    #[instrument(level = "trace", skip(self, patch))]
    fn update_project(
        &mut self,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Option<Project>, RemoteError> {
        patch.validate(id).map_err(|e| rejected(&e))?;
        Ok(query::update_project(&mut self.conn, id, patch)?)
    }

    #[instrument(level = "trace", skip(self))]
    fn delete_project(&mut self, id: &str) -> Result<(), RemoteError> {
        query::delete_project(&self.conn, id)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, task), fields(id = %task.id))]
    fn create_task(&mut self, task: Task) -> Result<Task, RemoteError> {
        task.validate().map_err(|e| rejected(&e))?;
        let owner = query::get_project(&self.conn, &task.project_id)?;
        if owner.is_none() {
            return Err(RemoteError::Rejected(format!(
                "task '{}' references unknown project '{}'",
                task.id, task.project_id
            )));
        }
        query::insert_task(&self.conn, &task)?;
        Ok(task)
    }

    #[instrument(level = "trace", skip(self, patch))]
    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, RemoteError> {
        patch.validate(id).map_err(|e| rejected(&e))?;
        Ok(query::update_task(&mut self.conn, id, patch)?)
    }

    #[instrument(level = "trace", skip(self))]
    fn delete_task(&mut self, id: &str) -> Result<(), RemoteError> {
        query::delete_task(&self.conn, id)?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self, data), fields(projects = data.projects.len(), tasks = data.tasks.len()))]
    fn replace_all(&mut self, data: BoardData) -> Result<BoardData, RemoteError> {
        for project in &data.projects {
            project.validate().map_err(|e| rejected(&e))?;
        }
        for task in &data.tasks {
            task.validate().map_err(|e| rejected(&e))?;
        }
        let stored = query::replace_all(&mut self.conn, &data).context("replace board")?;
        Ok(stored)
    }
}
