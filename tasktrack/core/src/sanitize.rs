//! Normalization applied to project and task inputs before submission.
//!
//! Blank optional text is submitted as an explicit empty string and blank dates as an
//! explicit `null`, so the server can tell "clear this field" from "leave it alone".
//! Dates typed without a time get a fixed mid-day time.
#[cfg(feature = "serde")]
use serde::Serialize;

use crate::ids::{ProjectId, TaskId};
use crate::input::{
    CreateProjectInput, CreateTaskInput, Patch, UpdateProjectInput, UpdateTaskInput,
};
use crate::project::ProjectStatus;
use crate::task::{TaskPriority, TaskStatus};

/// Time appended to due dates that carry only a calendar day.
pub const MIDDAY: &str = "T12:00:00Z";

/// Completes a typed due date into a UTC timestamp string.
///
/// Returns `None` for blank input.
pub fn normalize_due_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.split_once('T') {
        None => Some(format!("{trimmed}{MIDDAY}")),
        Some((date, time)) => Some(complete_time(date, time)),
    }
}

fn complete_time(date: &str, time: &str) -> String {
    let has_zone = time.ends_with('Z') || time.contains('+') || time.contains('-');
    if has_zone {
        return format!("{date}T{time}");
    }
    match time.matches(':').count() {
        0 => format!("{date}T{time}:00:00Z"),
        1 => format!("{date}T{time}:00Z"),
        _ => format!("{date}T{time}Z"),
    }
}

/// Blank or missing free text becomes an explicit empty string.
pub fn text_or_empty(value: Option<String>) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => String::new(),
    }
}

/// Free text patches: clearing submits `""`.
pub fn text_patch(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Unchanged => Patch::Unchanged,
        Patch::Set(text) if !text.trim().is_empty() => Patch::Set(text),
        Patch::Set(_) | Patch::Clear => Patch::Set(String::new()),
    }
}

/// Date patches: clearing submits `null`, set values are normalized.
pub fn date_patch(patch: Patch<String>) -> Patch<String> {
    match patch {
        Patch::Unchanged => Patch::Unchanged,
        Patch::Clear => Patch::Clear,
        Patch::Set(raw) => match normalize_due_date(&raw) {
            Some(date) => Patch::Set(date),
            None => Patch::Clear,
        },
    }
}

/// Sanitized arguments of the create-project mutation. Every field is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProjectChanges {
    pub id: ProjectId,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Patch::is_unchanged"))]
    pub description: Patch<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub status: Option<ProjectStatus>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Patch::is_unchanged"))]
    pub due_date: Patch<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NewTask {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee_email: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TaskChanges {
    pub id: TaskId,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Patch::is_unchanged"))]
    pub description: Patch<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub status: Option<TaskStatus>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub priority: Option<TaskPriority>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Patch::is_unchanged"))]
    pub assignee_email: Patch<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Patch::is_unchanged"))]
    pub due_date: Patch<String>,
}

impl CreateProjectInput {
    pub fn sanitize(self) -> NewProject {
        NewProject {
            name: self.name,
            description: text_or_empty(self.description),
            status: self.status.unwrap_or_default(),
            due_date: self.due_date.as_deref().and_then(normalize_due_date),
        }
    }
}

impl UpdateProjectInput {
    pub fn sanitize(self) -> ProjectChanges {
        ProjectChanges {
            id: self.id,
            name: self.name,
            description: text_patch(self.description),
            status: self.status,
            due_date: date_patch(self.due_date),
        }
    }
}

impl CreateTaskInput {
    pub fn sanitize(self) -> NewTask {
        NewTask {
            project_id: self.project_id,
            title: self.title,
            description: text_or_empty(self.description),
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            assignee_email: text_or_empty(self.assignee_email),
            due_date: self.due_date.as_deref().and_then(normalize_due_date),
        }
    }
}

impl UpdateTaskInput {
    pub fn sanitize(self) -> TaskChanges {
        TaskChanges {
            id: self.id,
            title: self.title,
            description: text_patch(self.description),
            status: self.status,
            priority: self.priority,
            assignee_email: text_patch(self.assignee_email),
            due_date: date_patch(self.due_date),
        }
    }
}
