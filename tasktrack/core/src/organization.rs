use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::OrganizationId;

/// A tenant. Its slug scopes every project and task request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub is_active: bool,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub project_count: u32,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::null_as_default")
    )]
    pub task_count: u32,
}

#[cfg(feature = "serde")]
fn default_active() -> bool {
    true
}

impl Organization {
    /// Short reference to this organization, as embedded in projects.
    pub fn to_ref(&self) -> OrganizationRef {
        OrganizationRef {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: Some(self.slug.clone()),
        }
    }
}

/// The slice of an organization that is embedded in projects and tasks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrganizationRef {
    pub id: OrganizationId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slug: Option<String>,
}
