//! Remote persistence collaborators.
//!
//! The optimistic store treats a [`Remote`] as the source of truth: every
//! local mutation is mirrored by one call here, and a failed call is answered
//! by reloading [`Remote::get_all`].
//!
//! Implementations:
//! - [`crate::db::SqliteRemote`]: durable SQLite file (default)
//! - [`memory::MemoryRemote`]: in-process store with scripted failures

pub mod memory;

pub use memory::{FaultPlan, MemoryRemote};

use crate::error::RemoteError;
use crate::model::{BoardData, Project, ProjectPatch, Task, TaskPatch};

/// Operations the board needs from durable storage.
///
/// Updates return `Ok(None)` when the id does not exist; deletes of a missing
/// id succeed silently.
pub trait Remote {
    /// # Errors
    /// Returns [`RemoteError`] if the store cannot be read.
    fn get_all(&mut self) -> Result<BoardData, RemoteError>;

    /// # Errors
    /// Returns [`RemoteError`] if the record is rejected or cannot be written.
    fn create_project(&mut self, project: Project) -> Result<Project, RemoteError>;

    /// # Errors
    /// Returns [`RemoteError`] if the patch is rejected or cannot be written.
    fn update_project(
        &mut self,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Option<Project>, RemoteError>;

    /// Delete a project and every task it owns.
    ///
    /// # Errors
    /// Returns [`RemoteError`] if the delete cannot be written.
    fn delete_project(&mut self, id: &str) -> Result<(), RemoteError>;

    /// # Errors
    /// Returns [`RemoteError`] if the record is rejected or cannot be written.
    fn create_task(&mut self, task: Task) -> Result<Task, RemoteError>;

    /// # Errors
    /// Returns [`RemoteError`] if the patch is rejected or cannot be written.
    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, RemoteError>;

    /// # Errors
    /// Returns [`RemoteError`] if the delete cannot be written.
    fn delete_task(&mut self, id: &str) -> Result<(), RemoteError>;

    /// Atomically replace the whole board and return the stored result.
    ///
    /// # Errors
    /// Returns [`RemoteError`] if the replacement fails; the previous
    /// contents must then be left intact.
    fn replace_all(&mut self, data: BoardData) -> Result<BoardData, RemoteError>;
}

impl<R: Remote + ?Sized> Remote for Box<R> {
    fn get_all(&mut self) -> Result<BoardData, RemoteError> {
        (**self).get_all()
    }

    fn create_project(&mut self, project: Project) -> Result<Project, RemoteError> {
        (**self).create_project(project)
    }

    fn update_project(
        &mut self,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Option<Project>, RemoteError> {
        (**self).update_project(id, patch)
    }

    fn delete_project(&mut self, id: &str) -> Result<(), RemoteError> {
        (**self).delete_project(id)
    }

    fn create_task(&mut self, task: Task) -> Result<Task, RemoteError> {
        (**self).create_task(task)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, RemoteError> {
        (**self).update_task(id, patch)
    }

    fn delete_task(&mut self, id: &str) -> Result<(), RemoteError> {
        (**self).delete_task(id)
    }

    fn replace_all(&mut self, data: BoardData) -> Result<BoardData, RemoteError> {
        (**self).replace_all(data)
    }
}
