pub mod ids;
pub mod project;
pub mod task;

pub use ids::new_id;
pub use project::{Project, ProjectPatch};
pub use task::{Priority, Task, TaskPatch};

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// The full board state as exchanged with a remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

impl BoardData {
    #[must_use]
    pub const fn new(projects: Vec<Project>, tasks: Vec<Task>) -> Self {
        Self { projects, tasks }
    }

    /// Sort both collections by id so two snapshots can be compared as sets.
    #[must_use]
    pub fn sorted_by_id(mut self) -> Self {
        self.projects.sort_by(|a, b| a.id.cmp(&b.id));
        self.tasks.sort_by(|a, b| a.id.cmp(&b.id));
        self
    }
}

/// Current wall clock in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn check_title(entity: &'static str, title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle { entity });
    }
    Ok(())
}

pub(crate) fn check_position(position: f64) -> Result<(), ValidationError> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinitePosition(position))
    }
}
