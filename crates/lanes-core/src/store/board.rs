//! Explicit board state.
//!
//! [`Board`] is a plain value: every mutator applies the change in place
//! and hands back the [`Dispatch`] that mirrors it remotely. Nothing here
//! blocks or talks to storage, so transitions and reconciliation can be
//! tested without a worker thread.

use std::collections::HashMap;
use tracing::{debug, warn};

use super::notice::Notice;
use super::worker::{Outcome, Reply};
use crate::error::ValidationError;
use crate::filter::{FilterSpec, FilterUpdate, visible_tasks};
use crate::model::{
    BoardData, Priority, Project, ProjectPatch, Task, TaskPatch, new_id, now_ms,
};
use crate::order::{
    complete_task, next_position, position_for_status_change, project_position_after_reorder,
    recalc_positions, sorted_by_position, task_position_after_reorder,
};

/// Why a remote write was issued; picks the notice shown on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CreateProject,
    RenameProject,
    DeleteProject,
    ReorderProject,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ReorderTask,
    ToggleTask,
    RenumberTasks,
}

impl Intent {
    /// Notice text on success. Moves and toggles stay quiet.
    #[must_use]
    pub const fn success_message(self) -> Option<&'static str> {
        match self {
            Self::CreateProject => Some("Project created"),
            Self::RenameProject => Some("Project updated"),
            Self::DeleteProject => Some("Project removed"),
            Self::CreateTask => Some("Task created"),
            Self::UpdateTask => Some("Task updated"),
            Self::DeleteTask => Some("Task deleted"),
            Self::ReorderProject | Self::ReorderTask | Self::ToggleTask | Self::RenumberTasks => {
                None
            }
        }
    }

    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::CreateProject => "Could not create the project",
            Self::RenameProject => "Could not update the project",
            Self::DeleteProject => "Could not remove the project",
            Self::ReorderProject => "Failed to reorder the project",
            Self::CreateTask => "Could not create the task",
            Self::UpdateTask => "Could not update the task",
            Self::DeleteTask => "Could not delete the task",
            Self::ReorderTask => "Failed to reorder the task",
            Self::ToggleTask => "Could not update the task status",
            Self::RenumberTasks => "Could not renumber tasks",
        }
    }
}

/// One remote write.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    CreateProject(Project),
    UpdateProject { id: String, patch: ProjectPatch },
    DeleteProject(String),
    CreateTask(Task),
    UpdateTask { id: String, patch: TaskPatch },
    DeleteTask(String),
}

impl RemoteOp {
    /// Id of the entity this write touches.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::CreateProject(project) => &project.id,
            Self::CreateTask(task) => &task.id,
            Self::UpdateProject { id, .. }
            | Self::UpdateTask { id, .. }
            | Self::DeleteProject(id)
            | Self::DeleteTask(id) => id,
        }
    }
}

/// A remote write tagged with the token of the local mutation it mirrors.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub token: u64,
    pub intent: Intent,
    pub op: RemoteOp,
}

/// Input for [`Board::add_task`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
}

/// Client-side view of the board.
#[derive(Debug, Clone, Default)]
pub struct Board {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    filters: FilterSpec,
    selected_task_id: Option<String>,
    last_used_project_id: Option<String>,
    ready: bool,
    token: u64,
    latest: HashMap<String, u64>,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ready board holding `data`.
    #[must_use]
    pub fn from_data(data: BoardData) -> Self {
        let mut board = Self::new();
        board.load(data);
        board
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Projects in storage order. Use [`Self::ordered_projects`] for display.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn ordered_projects(&self) -> Vec<&Project> {
        sorted_by_position(&self.projects)
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    #[must_use]
    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    #[must_use]
    pub fn last_used_project_id(&self) -> Option<&str> {
        self.last_used_project_id.as_deref()
    }

    /// Whether a wholesale load has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn project_by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    #[must_use]
    pub fn task_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks of `project_id` passing the active filters, by position.
    #[must_use]
    pub fn visible_tasks(&self, project_id: &str) -> Vec<&Task> {
        visible_tasks(&self.tasks, project_id, &self.filters)
    }

    #[must_use]
    pub fn data(&self) -> BoardData {
        BoardData::new(self.projects.clone(), self.tasks.clone())
    }

    // -----------------------------------------------------------------------
    // Wholesale replacement
    // -----------------------------------------------------------------------

    /// Adopt `data` as a fresh load: the first project becomes the default.
    pub fn load(&mut self, data: BoardData) {
        self.replace_data(data);
        self.last_used_project_id = self.first_project_id();
    }

    /// Adopt `data` after a failure, keeping view state that still applies.
    pub fn reload(&mut self, data: BoardData) {
        self.replace_data(data);
        let last_used_exists = self
            .last_used_project_id
            .as_deref()
            .is_some_and(|id| self.project_by_id(id).is_some());
        if !last_used_exists {
            self.last_used_project_id = self.first_project_id();
        }
    }

    fn replace_data(&mut self, data: BoardData) {
        self.projects = data.projects;
        self.tasks = data.tasks;
        self.ready = true;
        self.latest.clear();
        let selection_exists = self
            .selected_task_id
            .as_deref()
            .is_some_and(|id| self.task_by_id(id).is_some());
        if !selection_exists {
            self.selected_task_id = None;
        }
    }

    fn first_project_id(&self) -> Option<String> {
        self.ordered_projects()
            .first()
            .map(|project| project.id.clone())
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    pub fn set_filters(&mut self, update: FilterUpdate) {
        update.apply_to(&mut self.filters);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filters.query = query.into();
    }

    /// Select a task, or clear the selection with `None`. Unknown ids are ignored.
    pub fn select_task(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected_task_id = None;
                true
            }
            Some(id) if self.task_by_id(id).is_some() => {
                self.selected_task_id = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    fn touch(&mut self, id: &str) -> u64 {
        self.token += 1;
        self.latest.insert(id.to_string(), self.token);
        self.token
    }

    /// Whether a newer local mutation of `id` than `token` has been applied.
    #[must_use]
    pub fn is_stale(&self, id: &str, token: u64) -> bool {
        self.latest.get(id).is_some_and(|&latest| latest > token)
    }

    /// Forget `id` once its most recent write has answered.
    fn release(&mut self, id: &str, token: u64) {
        if self.latest.get(id) == Some(&token) {
            self.latest.remove(id);
        }
    }

    /// Append a project after the current last one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn add_project(&mut self, title: &str) -> Result<Dispatch, ValidationError> {
        let project = Project {
            id: new_id(),
            title: title.to_string(),
            position: next_position(&self.ordered_projects()),
            created_at: now_ms(),
        };
        project.validate()?;
        debug!(id = %project.id, position = project.position, "local: add project");

        self.projects.push(project.clone());
        self.last_used_project_id = Some(project.id.clone());
        let token = self.touch(&project.id);
        Ok(Dispatch {
            token,
            intent: Intent::CreateProject,
            op: RemoteOp::CreateProject(project),
        })
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn rename_project(
        &mut self,
        id: &str,
        title: &str,
    ) -> Result<Option<Dispatch>, ValidationError> {
        let patch = ProjectPatch::title(title);
        patch.validate(id)?;
        let Some(project) = self.projects.iter_mut().find(|project| project.id == id) else {
            return Ok(None);
        };
        patch.apply_to(project);
        debug!(id, "local: rename project");

        let token = self.touch(id);
        Ok(Some(Dispatch {
            token,
            intent: Intent::RenameProject,
            op: RemoteOp::UpdateProject {
                id: id.to_string(),
                patch,
            },
        }))
    }

    /// Remove a project and every task it owns.
    pub fn delete_project(&mut self, id: &str) -> Option<Dispatch> {
        let before = self.projects.len();
        self.projects.retain(|project| project.id != id);
        if self.projects.len() == before {
            return None;
        }
        self.tasks.retain(|task| task.project_id != id);
        self.selected_task_id = None;
        if self.last_used_project_id.as_deref() == Some(id) {
            self.last_used_project_id = self.first_project_id();
        }
        debug!(id, "local: delete project");

        let token = self.touch(id);
        Some(Dispatch {
            token,
            intent: Intent::DeleteProject,
            op: RemoteOp::DeleteProject(id.to_string()),
        })
    }

    /// Move project `active_id` into the slot held by `over_id`.
    pub fn reorder_projects(&mut self, active_id: &str, over_id: &str) -> Option<Dispatch> {
        let position = project_position_after_reorder(&self.projects, active_id, over_id)?;
        let project = self
            .projects
            .iter_mut()
            .find(|project| project.id == active_id)?;
        project.position = position;
        debug!(id = active_id, position, "local: reorder project");

        let token = self.touch(active_id);
        Some(Dispatch {
            token,
            intent: Intent::ReorderProject,
            op: RemoteOp::UpdateProject {
                id: active_id.to_string(),
                patch: ProjectPatch::position(position),
            },
        })
    }

    /// Append an active task after the last task of its project.
    ///
    /// Returns `Ok(None)` when the project is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title.
    pub fn add_task(&mut self, input: NewTask) -> Result<Option<Dispatch>, ValidationError> {
        let NewTask {
            project_id,
            title,
            description,
            priority,
        } = input;
        let position = next_position(&sorted_by_position(
            self.tasks.iter().filter(|task| task.project_id == project_id),
        ));
        let task = Task {
            id: new_id(),
            project_id,
            title,
            description: description.filter(|text| !text.is_empty()),
            priority,
            done: false,
            position,
            created_at: now_ms(),
            completed_at: None,
        };
        task.validate()?;
        if self.project_by_id(&task.project_id).is_none() {
            return Ok(None);
        }
        debug!(id = %task.id, project = %task.project_id, position, "local: add task");

        self.last_used_project_id = Some(task.project_id.clone());
        self.tasks.push(task.clone());
        let token = self.touch(&task.id);
        Ok(Some(Dispatch {
            token,
            intent: Intent::CreateTask,
            op: RemoteOp::CreateTask(task),
        }))
    }

    /// Apply a field patch to a task.
    ///
    /// A patch that flips `done` is completed the same way a toggle is:
    /// `completed_at` and `position` are filled in unless the patch sets them.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty patch, an empty title, or a
    /// `completed_at` that disagrees with the resulting `done`.
    pub fn update_task(
        &mut self,
        id: &str,
        mut patch: TaskPatch,
    ) -> Result<Option<Dispatch>, ValidationError> {
        patch.validate(id)?;
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(None);
        };
        let current = &self.tasks[index];
        if let Some(done) = patch.done
            && done != current.done
        {
            if patch.completed_at.is_none() {
                patch.completed_at = Some(done.then(now_ms));
            }
            if patch.position.is_none() {
                patch.position = Some(position_for_status_change(&self.tasks, current, done));
            }
        }
        patch.check_completion(current)?;
        patch.apply_to(&mut self.tasks[index]);
        debug!(id, "local: update task");

        let token = self.touch(id);
        Ok(Some(Dispatch {
            token,
            intent: Intent::UpdateTask,
            op: RemoteOp::UpdateTask {
                id: id.to_string(),
                patch,
            },
        }))
    }

    pub fn delete_task(&mut self, id: &str) -> Option<Dispatch> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return None;
        }
        if self.selected_task_id.as_deref() == Some(id) {
            self.selected_task_id = None;
        }
        debug!(id, "local: delete task");

        let token = self.touch(id);
        Some(Dispatch {
            token,
            intent: Intent::DeleteTask,
            op: RemoteOp::DeleteTask(id.to_string()),
        })
    }

    /// Move task `active_id` into the slot held by `over_id` in the same bucket.
    pub fn reorder_tasks(&mut self, active_id: &str, over_id: &str) -> Option<Dispatch> {
        let position = task_position_after_reorder(&self.tasks, active_id, over_id)?;
        let task = self.tasks.iter_mut().find(|task| task.id == active_id)?;
        task.position = position;
        debug!(id = active_id, position, "local: reorder task");

        let token = self.touch(active_id);
        Some(Dispatch {
            token,
            intent: Intent::ReorderTask,
            op: RemoteOp::UpdateTask {
                id: active_id.to_string(),
                patch: TaskPatch::position(position),
            },
        })
    }

    /// Flip a task between the active and done buckets.
    pub fn toggle_task(&mut self, id: &str) -> Option<Dispatch> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        let current = &self.tasks[index];
        let toggled = complete_task(current, !current.done);
        let position = position_for_status_change(&self.tasks, current, toggled.done);
        let patch = TaskPatch {
            done: Some(toggled.done),
            completed_at: Some(toggled.completed_at),
            position: Some(position),
            ..TaskPatch::default()
        };
        debug!(id, done = toggled.done, position, "local: toggle task");
        self.tasks[index] = Task {
            position,
            ..toggled
        };

        let token = self.touch(id);
        Some(Dispatch {
            token,
            intent: Intent::ToggleTask,
            op: RemoteOp::UpdateTask {
                id: id.to_string(),
                patch,
            },
        })
    }

    /// Respace one bucket to `GAP, 2*GAP, ...` keeping its order.
    ///
    /// Only tasks whose position actually changes produce a write.
    pub fn renumber_tasks(&mut self, project_id: &str, done: bool) -> Vec<Dispatch> {
        let ordered = sorted_by_position(
            self.tasks
                .iter()
                .filter(|task| task.project_id == project_id && task.done == done),
        );
        let changes: Vec<(String, f64)> = recalc_positions(&ordered)
            .into_iter()
            .zip(&ordered)
            .filter(|((_, position), task)| (task.position - position).abs() > f64::EPSILON)
            .map(|(change, _)| change)
            .collect();
        if changes.is_empty() {
            return Vec::new();
        }

        self.token += 1;
        let token = self.token;
        let mut dispatches = Vec::with_capacity(changes.len());
        for (id, position) in changes {
            if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
                task.position = position;
            }
            self.latest.insert(id.clone(), token);
            dispatches.push(Dispatch {
                token,
                intent: Intent::RenumberTasks,
                op: RemoteOp::UpdateTask {
                    id,
                    patch: TaskPatch::position(position),
                },
            });
        }
        debug!(project_id, done, moved = dispatches.len(), "local: renumber bucket");
        dispatches
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Fold one remote outcome back into the board.
    ///
    /// Returns the notice to surface, if any.
    pub fn reconcile(&mut self, reply: Reply) -> Option<Notice> {
        let Reply {
            token,
            subject,
            intent,
            outcome,
        } = reply;
        self.release(&subject, token);

        match outcome {
            Outcome::Project(project) => {
                if self.is_stale(&project.id, token) {
                    debug!(id = %project.id, token, "skip stale project merge");
                } else if let Some(slot) = self.projects.iter_mut().find(|p| p.id == project.id) {
                    *slot = project;
                }
                intent.success_message().map(Notice::success)
            }
            Outcome::Task(task) => {
                if self.is_stale(&task.id, token) {
                    debug!(id = %task.id, token, "skip stale task merge");
                } else if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
                    *slot = task;
                }
                intent.success_message().map(Notice::success)
            }
            Outcome::Deleted => intent.success_message().map(Notice::success),
            Outcome::Vanished(Ok(data)) => {
                debug!(id = %subject, "entity vanished remotely; reloading");
                self.reload(data);
                None
            }
            Outcome::Vanished(Err(error)) => {
                warn!(id = %subject, "entity vanished remotely and reload failed: {error}");
                None
            }
            Outcome::Failed { error, reload } => {
                let detail = match reload {
                    Ok(data) => {
                        self.reload(data);
                        error.to_string()
                    }
                    Err(reload_error) => {
                        warn!(id = %subject, "reload after failure failed: {reload_error}");
                        format!("{error}; reload failed: {reload_error}")
                    }
                };
                Some(Notice::error(intent.failure_message(), error.code(), detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Board, Intent, NewTask, RemoteOp};
    use crate::error::RemoteError;
    use crate::filter::{FilterUpdate, StatusFilter};
    use crate::model::{BoardData, Priority, Project, Task, TaskPatch};
    use crate::order::GAP;
    use crate::store::notice::NoticeLevel;
    use crate::store::worker::{Outcome, Reply};

    fn project(id: &str, position: f64) -> Project {
        Project {
            id: id.into(),
            title: format!("Project {id}"),
            position,
            created_at: 0,
        }
    }

    fn task(id: &str, project_id: &str, position: f64, done: bool) -> Task {
        Task {
            id: id.into(),
            project_id: project_id.into(),
            title: format!("Task {id}"),
            description: None,
            priority: Priority::Medium,
            done,
            position,
            created_at: 0,
            completed_at: done.then_some(1),
        }
    }

    fn board() -> Board {
        Board::from_data(BoardData::new(
            vec![project("p2", 2000.0), project("p1", 1000.0)],
            vec![
                task("t1", "p1", 1000.0, false),
                task("t2", "p1", 2000.0, false),
                task("t3", "p1", 3000.0, false),
                task("d1", "p1", 5000.0, true),
                task("x1", "p2", 1000.0, false),
            ],
        ))
    }

    fn position(board: &Board, id: &str) -> f64 {
        board.task_by_id(id).map(|t| t.position).unwrap()
    }

    #[test]
    fn load_picks_first_project_by_position() {
        let board = board();
        assert!(board.is_ready());
        assert_eq!(board.last_used_project_id(), Some("p1"));
    }

    #[test]
    fn add_project_appends_and_becomes_last_used() {
        let mut board = board();
        let dispatch = board.add_project("Later").unwrap();
        let RemoteOp::CreateProject(created) = &dispatch.op else {
            panic!("expected create, got {:?}", dispatch.op);
        };
        assert!((created.position - 3000.0).abs() < f64::EPSILON);
        assert_eq!(board.last_used_project_id(), Some(created.id.as_str()));
        assert_eq!(board.projects().len(), 3);
        assert!(board.add_project("  ").is_err());
        assert_eq!(board.projects().len(), 3);
    }

    #[test]
    fn add_task_goes_after_last_task_of_any_bucket() {
        let mut board = board();
        let dispatch = board
            .add_task(NewTask {
                project_id: "p1".into(),
                title: "New".into(),
                description: Some(String::new()),
                priority: Priority::High,
            })
            .unwrap()
            .unwrap();
        let RemoteOp::CreateTask(created) = dispatch.op else {
            panic!("expected create");
        };
        assert!((created.position - 6000.0).abs() < f64::EPSILON);
        assert_eq!(created.description, None);
        assert!(!created.done);
    }

    #[test]
    fn add_task_to_unknown_project_is_a_no_op() {
        let mut board = board();
        let result = board
            .add_task(NewTask {
                project_id: "nope".into(),
                title: "x".into(),
                ..NewTask::default()
            })
            .unwrap();
        assert!(result.is_none());
        assert_eq!(board.tasks().len(), 5);
    }

    #[test]
    fn reorder_moves_only_the_active_task() {
        let mut board = board();
        let dispatch = board.reorder_tasks("t1", "t2").unwrap();
        assert_eq!(dispatch.intent, Intent::ReorderTask);
        assert!((position(&board, "t1") - 2500.0).abs() < f64::EPSILON);
        assert!((position(&board, "t2") - 2000.0).abs() < f64::EPSILON);
        assert!((position(&board, "t3") - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cross_bucket_and_cross_project_moves_do_nothing() {
        let mut board = board();
        assert!(board.reorder_tasks("t1", "d1").is_none());
        assert!(board.reorder_tasks("t1", "x1").is_none());
        assert!(board.reorder_tasks("t1", "t1").is_none());
        assert!((position(&board, "t1") - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn toggle_moves_between_buckets() {
        let mut board = board();
        board.toggle_task("t1").unwrap();
        let done = board.task_by_id("t1").unwrap();
        assert!(done.done);
        assert!(done.completed_at.is_some());
        assert!((done.position - 6000.0).abs() < f64::EPSILON);

        board.toggle_task("t1").unwrap();
        let active = board.task_by_id("t1").unwrap();
        assert!(!active.done);
        assert_eq!(active.completed_at, None);
        assert!((active.position - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn update_task_that_flips_done_behaves_like_toggle() {
        let mut board = board();
        let patch = TaskPatch {
            done: Some(true),
            ..TaskPatch::default()
        };
        let dispatch = board.update_task("t2", patch).unwrap().unwrap();
        let RemoteOp::UpdateTask { patch, .. } = dispatch.op else {
            panic!("expected update");
        };
        assert!(matches!(patch.completed_at, Some(Some(_))));
        assert!(patch.position.is_some());
        assert!(board.task_by_id("t2").unwrap().done);
    }

    #[test]
    fn delete_project_cascades_and_clears_selection() {
        let mut board = board();
        assert!(board.select_task(Some("t1")));
        board.delete_project("p1").unwrap();
        assert!(board.tasks().iter().all(|t| t.project_id == "p2"));
        assert_eq!(board.selected_task_id(), None);
        assert_eq!(board.last_used_project_id(), Some("p2"));
        assert!(board.delete_project("p1").is_none());
    }

    #[test]
    fn renumber_respaces_a_crowded_bucket() {
        let mut board = Board::from_data(BoardData::new(
            vec![project("p1", 1000.0)],
            vec![
                task("a", "p1", 1.0, false),
                task("b", "p1", 1.5, false),
                task("c", "p1", 3000.0, false),
            ],
        ));
        let dispatches = board.renumber_tasks("p1", false);
        assert_eq!(dispatches.len(), 2);
        assert!((position(&board, "a") - GAP).abs() < f64::EPSILON);
        assert!((position(&board, "b") - 2.0 * GAP).abs() < f64::EPSILON);
        assert!(board.renumber_tasks("p1", false).is_empty());
    }

    #[test]
    fn filters_shape_visible_tasks() {
        let mut board = board();
        board.set_filters(FilterUpdate {
            status: Some(StatusFilter::Done),
            ..FilterUpdate::default()
        });
        let ids: Vec<_> = board.visible_tasks("p1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["d1"]);
        board.set_search_query("nothing matches");
        assert!(board.visible_tasks("p1").is_empty());
    }

    #[test]
    fn stale_success_does_not_overwrite_newer_local_change() {
        let mut board = board();
        let first = board.rename_project("p1", "First").unwrap().unwrap();
        let _second = board.rename_project("p1", "Second").unwrap().unwrap();

        let mut echoed = project("p1", 1000.0);
        echoed.title = "First".into();
        let notice = board.reconcile(Reply {
            token: first.token,
            subject: "p1".into(),
            intent: first.intent,
            outcome: Outcome::Project(echoed),
        });
        assert_eq!(board.project_by_id("p1").unwrap().title, "Second");
        assert_eq!(notice.unwrap().level, NoticeLevel::Success);
    }

    #[test]
    fn tokens_are_released_once_the_latest_write_answers() {
        let mut board = board();
        let first = board.rename_project("p1", "First").unwrap().unwrap();
        let second = board.rename_project("p1", "Second").unwrap().unwrap();
        let removed = board.delete_task("t1").unwrap();
        assert_eq!(board.latest.len(), 2);

        let mut echoed = project("p1", 1000.0);
        echoed.title = "First".into();
        board.reconcile(Reply {
            token: first.token,
            subject: "p1".into(),
            intent: first.intent,
            outcome: Outcome::Project(echoed.clone()),
        });
        assert!(board.is_stale("p1", first.token));

        echoed.title = "Second".into();
        board.reconcile(Reply {
            token: second.token,
            subject: "p1".into(),
            intent: second.intent,
            outcome: Outcome::Project(echoed),
        });
        board.reconcile(Reply {
            token: removed.token,
            subject: "t1".into(),
            intent: removed.intent,
            outcome: Outcome::Deleted,
        });
        assert!(board.latest.is_empty());
        assert_eq!(board.project_by_id("p1").unwrap().title, "Second");
    }

    #[test]
    fn reload_forgets_pending_tokens() {
        let mut board = board();
        board.toggle_task("t1").unwrap();
        board.reload(BoardData::default());
        assert!(board.latest.is_empty());
    }

    #[test]
    fn failure_discards_local_state_and_reports() {
        let mut board = board();
        let dispatch = board.delete_task("t1").unwrap();
        let canonical = BoardData::new(vec![project("p1", 1000.0)], vec![task("t1", "p1", 1.0, false)]);

        let notice = board
            .reconcile(Reply {
                token: dispatch.token,
                subject: "t1".into(),
                intent: dispatch.intent,
                outcome: Outcome::Failed {
                    error: RemoteError::Storage("disk full".into()),
                    reload: Ok(canonical.clone()),
                },
            })
            .unwrap();
        assert!(notice.is_error());
        assert_eq!(notice.message, "Could not delete the task");
        assert_eq!(board.data(), canonical);
    }

    #[test]
    fn vanished_entity_reloads_quietly() {
        let mut board = board();
        let dispatch = board.reorder_tasks("t3", "t1").unwrap();
        let notice = board.reconcile(Reply {
            token: dispatch.token,
            subject: "t3".into(),
            intent: dispatch.intent,
            outcome: Outcome::Vanished(Ok(BoardData::default())),
        });
        assert!(notice.is_none());
        assert!(board.tasks().is_empty());
        assert_eq!(board.last_used_project_id(), None);
    }
}
