//! Core domain model for Tasktrack.
//!
//! Everything in this crate is pure: entities as the API returns them, the typed
//! inputs accepted by mutations, the rules that normalize those inputs before they
//! are submitted, and the table describing which collections a mutation makes stale.
pub mod board;
pub mod comment;
pub mod ids;
pub mod input;
pub mod invalidation;
pub mod organization;
pub mod project;
pub mod sanitize;
pub mod stats;
pub mod task;

pub use board::{Board, Column};
pub use comment::{TaskComment, TaskRef};
pub use ids::{CommentId, OrganizationId, ProjectId, TaskId};
pub use input::{
    CreateCommentInput, CreateOrganizationInput, CreateProjectInput, CreateTaskInput, Patch,
    UpdateOrganizationInput, UpdateProjectInput, UpdateTaskInput,
};
pub use invalidation::{Collection, MutationKind};
pub use organization::{Organization, OrganizationRef};
pub use project::{Project, ProjectRef, ProjectStatus};
pub use stats::ProjectStats;
pub use task::{Task, TaskPriority, TaskStatus};

use thiserror::Error;

/// Raised when a status or priority value is outside its fixed enumeration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown project status '{0}'")]
    UnknownProjectStatus(String),
    #[error("Unknown task status '{0}'")]
    UnknownTaskStatus(String),
    #[error("Unknown task priority '{0}'")]
    UnknownTaskPriority(String),
}

/// Normalizes user-typed enum spellings ("in-progress", "On Hold") to the
/// wire form ("IN_PROGRESS", "ON_HOLD").
pub(crate) fn normalize_enum_spelling(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Reads an explicit `null` the same way as an absent field: as the default.
#[cfg(feature = "serde")]
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    let value: Option<T> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
