//! Typed inputs accepted by the mutating operations.
//!
//! Required fields are plain values. Optional fields on create inputs are `Option`s
//! (absent and blank mean the same thing there). Update inputs distinguish three
//! states for every clearable field through [`Patch`].
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

use crate::ids::{OrganizationId, ProjectId, TaskId};
use crate::project::ProjectStatus;
use crate::task::{TaskPriority, TaskStatus};

/// Edit applied to an optional field of an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    /// Leave the stored value as it is. The field is not submitted.
    #[default]
    Unchanged,
    /// Remove the stored value.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Patch::Unchanged)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Set(value)
    }
}

/// `Clear` goes out as `null`; `Unchanged` is expected to be skipped by the
/// containing struct.
#[cfg(feature = "serde")]
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Unchanged | Patch::Clear => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateOrganizationInput {
    pub name: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UpdateOrganizationInput {
    pub id: OrganizationId,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub contact_email: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub is_active: Option<bool>,
}

impl UpdateOrganizationInput {
    pub fn new(id: impl Into<OrganizationId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            contact_email: None,
            is_active: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    /// As typed: `YYYY-MM-DD`, a date-time, or blank.
    pub due_date: Option<String>,
}

impl CreateProjectInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: None,
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateProjectInput {
    pub id: ProjectId,
    pub name: Option<String>,
    pub description: Patch<String>,
    pub status: Option<ProjectStatus>,
    pub due_date: Patch<String>,
}

impl UpdateProjectInput {
    pub fn new(id: impl Into<ProjectId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: Patch::Unchanged,
            status: None,
            due_date: Patch::Unchanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskInput {
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_email: Option<String>,
    pub due_date: Option<String>,
}

impl CreateTaskInput {
    pub fn new(project_id: impl Into<ProjectId>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status: None,
            priority: None,
            assignee_email: None,
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskInput {
    pub id: TaskId,
    pub title: Option<String>,
    pub description: Patch<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_email: Patch<String>,
    pub due_date: Patch<String>,
}

impl UpdateTaskInput {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: Patch::Unchanged,
            status: None,
            priority: None,
            assignee_email: Patch::Unchanged,
            due_date: Patch::Unchanged,
        }
    }

    /// An update that only moves the task to another board column.
    pub fn move_to(id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::new(id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CreateCommentInput {
    pub task_id: TaskId,
    pub content: String,
    pub author_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_defaults_to_unchanged() {
        let patch: Patch<String> = Patch::default();

        assert!(patch.is_unchanged());
        assert_eq!(patch.value(), None);
    }

    #[test]
    fn move_to_only_touches_status() {
        let input = UpdateTaskInput::move_to("3", TaskStatus::Done);

        assert_eq!(input.status, Some(TaskStatus::Done));
        assert_eq!(input.title, None);
        assert!(input.description.is_unchanged());
        assert!(input.due_date.is_unchanged());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn update_organization_omits_untouched_fields() {
        let input = UpdateOrganizationInput {
            is_active: Some(false),
            ..UpdateOrganizationInput::new("4")
        };

        let json = serde_json::to_value(&input).unwrap();

        assert_eq!(json, serde_json::json!({ "id": "4", "isActive": false }));
    }
}
