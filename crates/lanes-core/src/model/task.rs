use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{check_position, check_title};
use crate::error::ValidationError;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                expected: "priority",
                got: s.to_string(),
            }),
        }
    }
}

/// A card on the board.
///
/// `position` is only comparable among tasks sharing `project_id` and `done`
/// (the task's bucket). `completed_at` is `Some` exactly when `done` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    pub done: bool,
    pub position: f64,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Task {
    /// Whether `other` lives in the same `(project_id, done)` bucket.
    #[must_use]
    pub fn same_bucket(&self, other: &Self) -> bool {
        self.project_id == other.project_id && self.done == other.done
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title or a non-finite position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title("task", &self.title)?;
        check_position(self.position)
    }
}

/// Partial update of a task. `project_id`, `id`, and `created_at` are immutable.
///
/// `completed_at` is tri-state: `None` leaves it untouched, `Some(None)`
/// clears it, `Some(Some(ts))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub done: Option<bool>,
    pub position: Option<f64>,
    pub completed_at: Option<Option<i64>>,
}

impl TaskPatch {
    #[must_use]
    pub const fn position(position: f64) -> Self {
        Self {
            title: None,
            description: None,
            priority: None,
            done: None,
            position: Some(position),
            completed_at: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.done.is_none()
            && self.position.is_none()
            && self.completed_at.is_none()
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] when the patch is empty, sets an empty
    /// title, or carries a non-finite position.
    pub fn validate(&self, id: &str) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch {
                entity: "task",
                id: id.to_string(),
            });
        }
        if let Some(title) = &self.title {
            check_title("task", title)?;
        }
        if let Some(position) = self.position {
            check_position(position)?;
        }
        Ok(())
    }

    /// Check that applying this patch to `task` keeps `completed_at` set
    /// exactly when the task is done.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CompletionMismatch`] otherwise.
    pub fn check_completion(&self, task: &Task) -> Result<(), ValidationError> {
        let done = self.done.unwrap_or(task.done);
        let completed_at = self.completed_at.unwrap_or(task.completed_at);
        if done == completed_at.is_some() {
            Ok(())
        } else {
            Err(ValidationError::CompletionMismatch {
                id: task.id.clone(),
            })
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(done) = self.done {
            task.done = done;
        }
        if let Some(position) = self.position {
            task.position = position;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
    }
}
