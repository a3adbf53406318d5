//! In-process remote store with scripted write failures.
//!
//! Cloning a [`MemoryRemote`] yields another handle to the same data, so a
//! test can hand one clone to the sync worker and keep another to inspect
//! the canonical state or inject faults.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use super::Remote;
use crate::error::RemoteError;
use crate::model::{BoardData, Project, ProjectPatch, Task, TaskPatch};

/// Fault injection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultPlan {
    /// Number of upcoming writes that fail before writes succeed again.
    pub fail_next_writes: u32,
    /// Every write fails while set.
    pub offline_writes: bool,
    /// `get_all` fails while set.
    pub offline_reads: bool,
}

#[derive(Debug, Default)]
struct Inner {
    data: BoardData,
    faults: FaultPlan,
    writes: u64,
}

impl Inner {
    fn check_write(&mut self, op: &str) -> Result<(), RemoteError> {
        self.writes += 1;
        if self.faults.offline_writes {
            return Err(RemoteError::Unavailable(format!("{op}: store offline")));
        }
        if self.faults.fail_next_writes > 0 {
            self.faults.fail_next_writes -= 1;
            return Err(RemoteError::Storage(format!("{op}: injected failure")));
        }
        Ok(())
    }

    fn has_project(&self, id: &str) -> bool {
        self.data.projects.iter().any(|project| project.id == id)
    }
}

/// Shared in-memory board.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without counting as a write.
    #[must_use]
    pub fn with_data(data: BoardData) -> Self {
        let remote = Self::new();
        if let Ok(mut inner) = remote.inner.lock() {
            inner.data = data;
        }
        remote
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, RemoteError> {
        self.inner
            .lock()
            .map_err(|_| RemoteError::Unavailable("memory store lock poisoned".into()))
    }

    /// Copy of the canonical contents.
    ///
    /// # Errors
    /// Returns [`RemoteError::Unavailable`] if the lock is poisoned.
    pub fn snapshot(&self) -> Result<BoardData, RemoteError> {
        Ok(self.lock()?.data.clone())
    }

    /// Replace the fault plan.
    ///
    /// # Errors
    /// Returns [`RemoteError::Unavailable`] if the lock is poisoned.
    pub fn set_faults(&self, faults: FaultPlan) -> Result<(), RemoteError> {
        self.lock()?.faults = faults;
        Ok(())
    }

    /// Make the next `count` writes fail.
    ///
    /// # Errors
    /// Returns [`RemoteError::Unavailable`] if the lock is poisoned.
    pub fn fail_next_writes(&self, count: u32) -> Result<(), RemoteError> {
        self.lock()?.faults.fail_next_writes = count;
        Ok(())
    }

    /// Number of write calls received so far, failed ones included.
    ///
    /// # Errors
    /// Returns [`RemoteError::Unavailable`] if the lock is poisoned.
    pub fn write_count(&self) -> Result<u64, RemoteError> {
        Ok(self.lock()?.writes)
    }
}

fn rejected(err: &crate::error::ValidationError) -> RemoteError {
    RemoteError::Rejected(err.to_string())
}

impl Remote for MemoryRemote {
    fn get_all(&mut self) -> Result<BoardData, RemoteError> {
        let inner = self.lock()?;
        if inner.faults.offline_reads {
            return Err(RemoteError::Unavailable("get_all: store offline".into()));
        }
        Ok(inner.data.clone())
    }

    fn create_project(&mut self, project: Project) -> Result<Project, RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("create_project")?;
        project.validate().map_err(|e| rejected(&e))?;
        if inner.has_project(&project.id) {
            return Err(RemoteError::Rejected(format!(
                "project '{}' already exists",
                project.id
            )));
        }
        trace!(id = %project.id, "memory: create project");
        inner.data.projects.push(project.clone());
        Ok(project)
    }

    fn update_project(
        &mut self,
        id: &str,
        patch: &ProjectPatch,
    ) -> Result<Option<Project>, RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("update_project")?;
        patch.validate(id).map_err(|e| rejected(&e))?;
        Ok(inner
            .data
            .projects
            .iter_mut()
            .find(|project| project.id == id)
            .map(|project| {
                patch.apply_to(project);
                project.clone()
            }))
    }

    fn delete_project(&mut self, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("delete_project")?;
        inner.data.projects.retain(|project| project.id != id);
        inner.data.tasks.retain(|task| task.project_id != id);
        Ok(())
    }

    fn create_task(&mut self, task: Task) -> Result<Task, RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("create_task")?;
        task.validate().map_err(|e| rejected(&e))?;
        if !inner.has_project(&task.project_id) {
            return Err(RemoteError::Rejected(format!(
                "task '{}' references unknown project '{}'",
                task.id, task.project_id
            )));
        }
        if inner.data.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(RemoteError::Rejected(format!(
                "task '{}' already exists",
                task.id
            )));
        }
        trace!(id = %task.id, "memory: create task");
        inner.data.tasks.push(task.clone());
        Ok(task)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Option<Task>, RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("update_task")?;
        patch.validate(id).map_err(|e| rejected(&e))?;
        let Some(task) = inner.data.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        patch.check_completion(task).map_err(|e| rejected(&e))?;
        patch.apply_to(task);
        Ok(Some(task.clone()))
    }

    fn delete_task(&mut self, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("delete_task")?;
        inner.data.tasks.retain(|task| task.id != id);
        Ok(())
    }

    fn replace_all(&mut self, data: BoardData) -> Result<BoardData, RemoteError> {
        let mut inner = self.lock()?;
        inner.check_write("replace_all")?;
        for project in &data.projects {
            project.validate().map_err(|e| rejected(&e))?;
        }
        for task in &data.tasks {
            task.validate().map_err(|e| rejected(&e))?;
            if !data.projects.iter().any(|p| p.id == task.project_id) {
                return Err(RemoteError::Rejected(format!(
                    "task '{}' references unknown project '{}'",
                    task.id, task.project_id
                )));
            }
        }
        inner.data = data.clone();
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultPlan, MemoryRemote};
    use crate::error::RemoteError;
    use crate::model::{BoardData, Priority, Project, ProjectPatch, Task, TaskPatch};
    use crate::remote::Remote;

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            title: id.into(),
            position: 1000.0,
            created_at: 1,
        }
    }

    fn task(id: &str, project_id: &str) -> Task {
        Task {
            id: id.into(),
            project_id: project_id.into(),
            title: id.into(),
            description: None,
            priority: Priority::Low,
            done: false,
            position: 1000.0,
            created_at: 1,
            completed_at: None,
        }
    }

    #[test]
    fn clones_share_state() {
        let mut writer = MemoryRemote::new();
        let reader = writer.clone();
        writer.create_project(project("p1")).unwrap();
        assert_eq!(reader.snapshot().unwrap().projects.len(), 1);
    }

    #[test]
    fn delete_project_cascades_to_tasks() {
        let mut remote = MemoryRemote::new();
        remote.create_project(project("p1")).unwrap();
        remote.create_project(project("p2")).unwrap();
        remote.create_task(task("t1", "p1")).unwrap();
        remote.create_task(task("t2", "p2")).unwrap();

        remote.delete_project("p1").unwrap();
        let data = remote.get_all().unwrap();
        assert_eq!(data.projects.len(), 1);
        assert_eq!(data.tasks.len(), 1);
        assert_eq!(data.tasks[0].id, "t2");
    }

    #[test]
    fn update_of_missing_id_is_none() {
        let mut remote = MemoryRemote::new();
        let updated = remote
            .update_project("ghost", &ProjectPatch::title("x"))
            .unwrap();
        assert_eq!(updated, None);
        let updated = remote
            .update_task("ghost", &TaskPatch::position(5.0))
            .unwrap();
        assert_eq!(updated, None);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let mut remote = MemoryRemote::new();
        remote.fail_next_writes(1).unwrap();
        assert!(matches!(
            remote.create_project(project("p1")),
            Err(RemoteError::Storage(_))
        ));
        remote.create_project(project("p1")).unwrap();
        assert_eq!(remote.write_count().unwrap(), 2);
    }

    #[test]
    fn offline_writes_fail_but_reads_succeed() {
        let mut remote = MemoryRemote::with_data(BoardData::new(vec![project("p1")], vec![]));
        remote
            .set_faults(FaultPlan {
                offline_writes: true,
                ..FaultPlan::default()
            })
            .unwrap();
        assert!(remote.delete_project("p1").is_err());
        assert_eq!(remote.get_all().unwrap().projects.len(), 1);
    }

    #[test]
    fn rejected_replace_all_keeps_previous_contents() {
        let mut remote = MemoryRemote::with_data(BoardData::new(vec![project("p1")], vec![]));
        let orphan = BoardData::new(vec![project("p2")], vec![task("t1", "missing")]);
        assert!(matches!(
            remote.replace_all(orphan),
            Err(RemoteError::Rejected(_))
        ));
        assert_eq!(remote.snapshot().unwrap().projects[0].id, "p1");
    }

    #[test]
    fn task_for_unknown_project_is_rejected() {
        let mut remote = MemoryRemote::new();
        assert!(matches!(
            remote.create_task(task("t1", "nope")),
            Err(RemoteError::Rejected(_))
        ));
    }
}
