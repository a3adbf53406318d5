//! Read-side projection of the visible tasks in a project.
//!
//! Everything here is pure: filters are applied to a borrowed task slice on
//! every read and never mutate the store.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::model::{Priority, Task, task::ParseEnumError};
use crate::order::sorted_by_position;

/// Priority filter: a single priority, or everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    #[must_use]
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Low => priority == Priority::Low,
            Self::Medium => priority == Priority::Medium,
            Self::High => priority == Priority::High,
        }
    }
}

impl From<Priority> for PriorityFilter {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Low => Self::Low,
            Priority::Medium => Self::Medium,
            Priority::High => Self::High,
        }
    }
}

/// Completion filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Done,
}

impl StatusFilter {
    #[must_use]
    pub const fn matches(self, done: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !done,
            Self::Done => done,
        }
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Done => "done",
        })
    }
}

impl FromStr for PriorityFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Priority>().map(Self::from)
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "open" => Ok(Self::Active),
            "done" | "completed" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// Active filters for the board view.
///
/// All fields combine with AND semantics. An empty `query` matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub priority: PriorityFilter,
    #[serde(default)]
    pub status: StatusFilter,
}

impl FilterSpec {
    /// Whether `task` passes every active filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if !self.query.is_empty() {
            let haystack = format!(
                "{} {}",
                task.title,
                task.description.as_deref().unwrap_or_default()
            )
            .to_lowercase();
            if !haystack.contains(&self.query.to_lowercase()) {
                return false;
            }
        }
        self.priority.matches(task.priority) && self.status.matches(task.done)
    }
}

/// Partial change to a [`FilterSpec`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub query: Option<String>,
    pub priority: Option<PriorityFilter>,
    pub status: Option<StatusFilter>,
}

impl FilterUpdate {
    pub fn apply_to(self, spec: &mut FilterSpec) {
        if let Some(query) = self.query {
            spec.query = query;
        }
        if let Some(priority) = self.priority {
            spec.priority = priority;
        }
        if let Some(status) = self.status {
            spec.status = status;
        }
    }
}

/// Visible tasks of `project_id`, ascending by position.
#[must_use]
pub fn visible_tasks<'a>(tasks: &'a [Task], project_id: &str, filters: &FilterSpec) -> Vec<&'a Task> {
    sorted_by_position(
        tasks
            .iter()
            .filter(|task| task.project_id == project_id && filters.matches(task)),
    )
}
