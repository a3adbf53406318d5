use serde::{Deserialize, Serialize};

use super::{check_position, check_title};
use crate::error::ValidationError;

/// A board column. Projects are totally ordered by `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub position: f64,
    pub created_at: i64,
}

impl Project {
    /// Check the fields a remote store requires before accepting the record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty title or a non-finite position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_title("project", &self.title)?;
        check_position(self.position)
    }
}

/// Partial update of a project. Only rename and reorder touch a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub position: Option<f64>,
}

impl ProjectPatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            position: None,
        }
    }

    #[must_use]
    pub const fn position(position: f64) -> Self {
        Self {
            title: None,
            position: Some(position),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.position.is_none()
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] when the patch is empty, sets an empty
    /// title, or carries a non-finite position.
    pub fn validate(&self, id: &str) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch {
                entity: "project",
                id: id.to_string(),
            });
        }
        if let Some(title) = &self.title {
            check_title("project", title)?;
        }
        if let Some(position) = self.position {
            check_position(position)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title.clone_from(title);
        }
        if let Some(position) = self.position {
            project.position = position;
        }
    }
}
