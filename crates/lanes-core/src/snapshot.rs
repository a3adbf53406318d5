//! Versioned export/import document.
//!
//! ```json
//! { "version": 1, "exportedAt": 1718000000000, "projects": [...], "tasks": [...] }
//! ```
//!
//! Positions and timestamps round-trip exactly; anything but `version: 1`
//! is rejected before the board is touched.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{BoardData, Project, Task, now_ms};

/// The only backup version this build reads or writes.
pub const BACKUP_VERSION: u64 = 1;

/// Full-state backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub version: u64,
    pub exported_at: i64,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

impl ExportPayload {
    /// Stamp `data` as a current-version backup taken now.
    #[must_use]
    pub fn from_board(data: BoardData) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: now_ms(),
            projects: data.projects,
            tasks: data.tasks,
        }
    }

    #[must_use]
    pub fn into_board(self) -> BoardData {
        BoardData::new(self.projects, self.tasks)
    }

    /// Check version, titles, positions, and task ownership.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnsupportedVersion`] for any version other
    /// than [`BACKUP_VERSION`], or the first record-level error found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != BACKUP_VERSION {
            return Err(ValidationError::UnsupportedVersion(self.version.to_string()));
        }
        for project in &self.projects {
            project.validate()?;
        }
        for task in &self.tasks {
            task.validate()?;
            if !self.projects.iter().any(|p| p.id == task.project_id) {
                return Err(ValidationError::Malformed(format!(
                    "task '{}' references unknown project '{}'",
                    task.id, task.project_id
                )));
            }
        }
        Ok(())
    }

    /// Pretty JSON rendering used by `export`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ValidationError> {
        serde_json::to_string_pretty(self).map_err(|e| ValidationError::Malformed(e.to_string()))
    }
}

/// `1` and `1.0` both name the current version.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)] // version numbers are tiny integers
fn is_current_version(n: &serde_json::Number) -> bool {
    n.as_u64() == Some(BACKUP_VERSION) || n.as_f64() == Some(BACKUP_VERSION as f64)
}

/// Parse and validate a backup document.
///
/// The version is checked before the rest of the document, so a future
/// backup with a different shape reports the version mismatch instead of a
/// field error. `1.0` counts as version 1.
///
/// # Errors
///
/// Returns [`ValidationError`] for malformed JSON, a missing or unsupported
/// version, or invalid records.
pub fn parse_backup(raw: &str) -> Result<ExportPayload, ValidationError> {
    let mut doc: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let Some(fields) = doc.as_object_mut() else {
        return Err(ValidationError::Malformed(
            "backup must be a JSON object".into(),
        ));
    };
    match fields.get("version") {
        Some(serde_json::Value::Number(n)) if is_current_version(n) => {}
        Some(serde_json::Value::Number(n)) => {
            return Err(ValidationError::UnsupportedVersion(n.to_string()));
        }
        Some(other) => {
            return Err(ValidationError::Malformed(format!(
                "version must be a number, got {other}"
            )));
        }
        None => return Err(ValidationError::Malformed("missing field `version`".into())),
    }
    fields.insert("version".into(), BACKUP_VERSION.into());

    let payload: ExportPayload =
        serde_json::from_value(doc).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    payload.validate()?;
    Ok(payload)
}

/// Task count for one project in an [`ExportSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCount {
    pub project_id: String,
    pub tasks: usize,
}

/// Counts shown after an export or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub project_count: usize,
    pub task_count: usize,
    pub by_project: Vec<ProjectCount>,
}

/// Summarize a board: totals plus per-project task counts in project order.
#[must_use]
pub fn summarize_export(projects: &[Project], tasks: &[Task]) -> ExportSummary {
    ExportSummary {
        project_count: projects.len(),
        task_count: tasks.len(),
        by_project: projects
            .iter()
            .map(|project| ProjectCount {
                project_id: project.id.clone(),
                tasks: tasks.iter().filter(|t| t.project_id == project.id).count(),
            })
            .collect(),
    }
}
