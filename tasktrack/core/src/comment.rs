use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, TaskId};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TaskComment {
    pub id: CommentId,
    pub content: String,
    pub author_email: String,
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub updated_at: Option<DateTime<Utc>>,
    pub task: TaskRef,
}

/// The slice of a task embedded in its comments.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskRef {
    pub id: TaskId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
}
