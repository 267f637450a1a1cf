//! Which collections each mutation makes stale.

/// A collection the data layer keeps and refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Organizations,
    Projects,
    Tasks,
    Stats,
    /// Comments of the task the mutation touched.
    Comments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateOrganization,
    UpdateOrganization,
    DeleteOrganization,
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    DeleteTask,
    CreateComment,
}

use Collection::*;

/// Task counters are derived server-side into projects and stats, so task mutations
/// invalidate both.
pub const INVALIDATIONS: &[(MutationKind, &[Collection])] = &[
    (MutationKind::CreateOrganization, &[Organizations]),
    (MutationKind::UpdateOrganization, &[Organizations]),
    (MutationKind::DeleteOrganization, &[Organizations]),
    (MutationKind::CreateProject, &[Projects, Stats]),
    (MutationKind::UpdateProject, &[Projects, Stats]),
    (MutationKind::DeleteProject, &[Projects, Stats]),
    (MutationKind::CreateTask, &[Tasks, Projects, Stats]),
    (MutationKind::UpdateTask, &[Tasks, Projects, Stats]),
    (MutationKind::DeleteTask, &[Tasks, Projects, Stats]),
    (MutationKind::CreateComment, &[Comments, Tasks]),
];

impl MutationKind {
    pub const ALL: [MutationKind; 10] = [
        MutationKind::CreateOrganization,
        MutationKind::UpdateOrganization,
        MutationKind::DeleteOrganization,
        MutationKind::CreateProject,
        MutationKind::UpdateProject,
        MutationKind::DeleteProject,
        MutationKind::CreateTask,
        MutationKind::UpdateTask,
        MutationKind::DeleteTask,
        MutationKind::CreateComment,
    ];

    /// Collections to refetch once this mutation has succeeded.
    pub fn invalidates(self) -> &'static [Collection] {
        INVALIDATIONS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, collections)| *collections)
            .unwrap_or(&[])
    }
}
