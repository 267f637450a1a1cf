use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, ProjectId};
use crate::organization::OrganizationRef;
use crate::{ParseError, normalize_enum_spelling};

/// Lifecycle of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
        ProjectStatus::Archived,
    ];

    /// The value the API uses for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "ACTIVE",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_enum_spelling(s);
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseError::UnknownProjectStatus(s.to_string()))
    }
}

/// A project as returned by the API, including the counters the server derives
/// from its tasks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    pub status: ProjectStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organization: OrganizationRef,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub task_count: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub completed_tasks: u32,
    /// Percentage in `0.0..=100.0`.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub completion_rate: f64,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub is_overdue: bool,
}

impl Project {
    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization.id
    }

    /// Whether the project is past due at `now`. Completed projects are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => now.date_naive() > due && self.status != ProjectStatus::Completed,
            None => false,
        }
    }
}

/// The slice of a project embedded in tasks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub organization: Option<OrganizationRef>,
}
