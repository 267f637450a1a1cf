#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregate counters computed by the server for the current organization.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ProjectStats {
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub total_projects: u32,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub active_projects: u32,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub completed_projects: u32,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub total_tasks: u32,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub completed_tasks: u32,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::null_as_default"))]
    pub completion_rate: f64,
}
