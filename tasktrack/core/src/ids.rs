//! Opaque identifiers assigned by the server.
//!
//! The API hands out string ids; wrapping each in its own type keeps a task id from
//! being passed where a project id is expected.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of an [`crate::Organization`].
    OrganizationId
);
id_type!(
    /// Identifier of a [`crate::Project`].
    ProjectId
);
id_type!(
    /// Identifier of a [`crate::Task`].
    TaskId
);
id_type!(
    /// Identifier of a [`crate::TaskComment`].
    CommentId
);
