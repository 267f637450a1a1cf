//! The data-access layer consumers build on.
//!
//! [`DataService`] owns the collections shown to the user, keeps them consistent
//! with the selected organization and refetches whatever a mutation made stale.
//! Failures never escape: reads record an error on the collection, mutations log
//! and return `None` or `false`.

mod loadable;

pub use loadable::Loadable;

use crate::graphql::operations::{
    CreateComment, CreateOrganization, CreateProject, CreateTask, DeleteOrganization,
    DeleteProject, DeleteTask, IdVariables, NoVariables, OrganizationBySlug, Organizations,
    Payload, ProjectById, ProjectFilter, ProjectStatsQuery, Projects, SlugVariables, TaskById,
    TaskComments, TaskFilter, TaskIdVariables, Tasks, UpdateOrganization, UpdateProject,
    UpdateTask,
};
use crate::graphql::{ClientError, RemoteClient, Transport};
use crate::preferences::PreferenceStore;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tasktrack_core::{
    Board, Collection, CreateCommentInput, CreateOrganizationInput, CreateProjectInput,
    CreateTaskInput, MutationKind, Organization, OrganizationId, Project, ProjectId, ProjectStats,
    Task, TaskComment, TaskId, TaskStatus, UpdateOrganizationInput, UpdateProjectInput,
    UpdateTaskInput,
};

/// Page sizes used when loading the scoped collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub projects: u32,
    pub tasks: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            projects: 50,
            tasks: 100,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    /// Bumped whenever the organization changes; responses started under an older
    /// value are dropped.
    generation: u64,
    organizations: Loadable<Vec<Organization>>,
    projects: Loadable<Vec<Project>>,
    tasks: Loadable<Vec<Task>>,
    stats: Loadable<Option<ProjectStats>>,
    comments: HashMap<TaskId, Loadable<Vec<TaskComment>>>,
}

impl State {
    fn organizations_mut(&mut self) -> &mut Loadable<Vec<Organization>> {
        &mut self.organizations
    }

    fn projects_mut(&mut self) -> &mut Loadable<Vec<Project>> {
        &mut self.projects
    }

    fn tasks_mut(&mut self) -> &mut Loadable<Vec<Task>> {
        &mut self.tasks
    }

    fn stats_mut(&mut self) -> &mut Loadable<Option<ProjectStats>> {
        &mut self.stats
    }

    fn reset_scope(&mut self) {
        self.generation += 1;
        self.projects = Loadable::default();
        self.tasks = Loadable::default();
        self.stats = Loadable::default();
        self.comments.clear();
    }
}

type Slot<D> = fn(&mut State) -> &mut Loadable<D>;

pub struct DataService<T: Transport, P: PreferenceStore> {
    client: RemoteClient<T, P>,
    limits: Limits,
    state: Mutex<State>,
}

impl<T: Transport, P: PreferenceStore> DataService<T, P> {
    pub fn new(client: RemoteClient<T, P>, limits: Limits) -> Self {
        Self {
            client,
            limits,
            state: Mutex::new(State::default()),
        }
    }

    pub fn client(&self) -> &RemoteClient<T, P> {
        &self.client
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Selection

    pub fn current_organization(&self) -> Option<Organization> {
        self.client.current_organization()
    }

    /// Switches to `organization`, discarding everything loaded under the previous
    /// one, and reloads the organization-scoped collections.
    ///
    /// Returns `false` if the selection could not be saved, in which case nothing
    /// changes.
    #[tracing::instrument(skip(self, organization), fields(slug = %organization.slug))]
    pub async fn set_current_organization(&self, organization: &Organization) -> bool {
        if let Err(e) = self
            .client
            .preferences()
            .set_current_organization(organization)
        {
            tracing::error!("Error saving selected organization: {}", e);
            return false;
        }
        self.state().reset_scope();
        self.refetch_scoped().await;
        true
    }

    #[tracing::instrument(skip(self))]
    pub fn clear_current_organization(&self) -> bool {
        if let Err(e) = self.client.preferences().clear_current_organization() {
            tracing::error!("Error clearing selected organization: {}", e);
            return false;
        }
        self.state().reset_scope();
        true
    }

    /// Selects the organization with `slug`, looking it up on the server if it is
    /// not among the loaded organizations.
    pub async fn select_organization(&self, slug: &str) -> Option<Organization> {
        let known = self
            .state()
            .organizations
            .data
            .iter()
            .find(|organization| organization.slug == slug)
            .cloned();
        let organization = match known {
            Some(organization) => organization,
            None => self.find_organization(slug).await?,
        };
        if self.set_current_organization(&organization).await {
            Some(organization)
        } else {
            None
        }
    }

    // Reads

    pub fn organizations(&self) -> Loadable<Vec<Organization>> {
        self.state().organizations.clone()
    }

    pub fn projects(&self) -> Loadable<Vec<Project>> {
        self.state().projects.clone()
    }

    pub fn tasks(&self) -> Loadable<Vec<Task>> {
        self.state().tasks.clone()
    }

    pub fn project_stats(&self) -> Loadable<Option<ProjectStats>> {
        self.state().stats.clone()
    }

    /// Comments of one task, as last loaded by [`DataService::load_comments`].
    pub fn comments(&self, task_id: &TaskId) -> Loadable<Vec<TaskComment>> {
        self.state()
            .comments
            .get(task_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn comments_by_task(&self, task_id: &TaskId) -> Vec<TaskComment> {
        self.comments(task_id).data
    }

    /// The loaded tasks belonging to `project_id`, in collection order.
    pub fn tasks_by_project(&self, project_id: &ProjectId) -> Vec<Task> {
        self.state()
            .tasks
            .data
            .iter()
            .filter(|task| task.project_id() == project_id)
            .cloned()
            .collect()
    }

    pub fn board(&self, project_id: &ProjectId) -> Board {
        Board::for_project(&self.state().tasks.data, project_id)
    }

    /// Loads every collection available in the current scope.
    pub async fn load(&self) {
        futures::join!(self.refetch_organizations(), self.refetch_scoped());
    }

    async fn refetch_scoped(&self) {
        futures::join!(
            self.refetch_projects(),
            self.refetch_tasks(),
            self.refetch_stats()
        );
    }

    #[tracing::instrument(skip(self))]
    pub async fn refetch_organizations(&self) {
        self.state().organizations.start();
        let result = self.client.query::<Organizations>(&NoVariables {}).await;
        self.state().organizations.settle("organizations", result);
    }

    #[tracing::instrument(skip(self))]
    pub async fn refetch_projects(&self) {
        let generation = self.begin(State::projects_mut);
        let filter = ProjectFilter::page(self.limits.projects, 0);
        let result = self.client.query::<Projects>(&filter).await;
        self.settle(generation, State::projects_mut, "projects", result);
    }

    #[tracing::instrument(skip(self))]
    pub async fn refetch_tasks(&self) {
        let generation = self.begin(State::tasks_mut);
        let filter = TaskFilter::page(self.limits.tasks, 0);
        let result = self.client.query::<Tasks>(&filter).await;
        self.settle(generation, State::tasks_mut, "tasks", result);
    }

    #[tracing::instrument(skip(self))]
    pub async fn refetch_stats(&self) {
        let generation = self.begin(State::stats_mut);
        let result = self.client.query::<ProjectStatsQuery>(&NoVariables {}).await;
        self.settle(generation, State::stats_mut, "project stats", result);
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_comments(&self, task_id: &TaskId) {
        let generation = {
            let mut state = self.state();
            state.comments.entry(task_id.clone()).or_default().start();
            state.generation
        };
        let variables = TaskIdVariables {
            task_id: task_id.clone(),
        };
        let result = self.client.query::<TaskComments>(&variables).await;

        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!("Dropping comments loaded for a previous organization");
            return;
        }
        state
            .comments
            .entry(task_id.clone())
            .or_default()
            .settle("comments", result);
    }

    fn begin<D: Default>(&self, slot: Slot<D>) -> u64 {
        let mut state = self.state();
        slot(&mut state).start();
        state.generation
    }

    fn settle<D: Default>(
        &self,
        generation: u64,
        slot: Slot<D>,
        what: &str,
        result: Result<Option<D>, ClientError>,
    ) {
        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!("Dropping {} loaded for a previous organization", what);
            return;
        }
        slot(&mut state).settle(what, result);
    }

    async fn refetch(&self, collection: Collection, task_id: Option<&TaskId>) {
        match collection {
            Collection::Organizations => self.refetch_organizations().await,
            Collection::Projects => self.refetch_projects().await,
            Collection::Tasks => self.refetch_tasks().await,
            Collection::Stats => self.refetch_stats().await,
            Collection::Comments => {
                if let Some(task_id) = task_id {
                    self.load_comments(task_id).await;
                }
            }
        }
    }

    /// Reloads, concurrently, every collection `kind` makes stale.
    async fn refetch_after(&self, kind: MutationKind, task_id: Option<&TaskId>) {
        let refetches = kind
            .invalidates()
            .iter()
            .map(|collection| self.refetch(*collection, task_id));
        join_all(refetches).await;
    }

    // One-shot lookups

    #[tracing::instrument(skip(self))]
    pub async fn find_organization(&self, slug: &str) -> Option<Organization> {
        let variables = SlugVariables {
            slug: slug.to_string(),
        };
        let result = self.client.query::<OrganizationBySlug>(&variables).await;
        log_failure("looking up organization", result)
            .flatten()
            .flatten()
    }

    #[tracing::instrument(skip(self))]
    pub async fn project(&self, id: &ProjectId) -> Option<Project> {
        let result = self
            .client
            .query::<ProjectById>(&IdVariables { id: id.clone() })
            .await;
        log_failure("loading project", result).flatten().flatten()
    }

    #[tracing::instrument(skip(self))]
    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        let result = self
            .client
            .query::<TaskById>(&IdVariables { id: id.clone() })
            .await;
        log_failure("loading task", result).flatten().flatten()
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_projects(&self, filter: ProjectFilter) -> Vec<Project> {
        let result = self.client.query::<Projects>(&filter).await;
        log_failure("searching projects", result)
            .flatten()
            .unwrap_or_default()
    }

    #[tracing::instrument(skip(self))]
    pub async fn search_tasks(&self, filter: TaskFilter) -> Vec<Task> {
        let result = self.client.query::<Tasks>(&filter).await;
        log_failure("searching tasks", result)
            .flatten()
            .unwrap_or_default()
    }

    // Mutations

    #[tracing::instrument(skip(self))]
    pub async fn create_organization(&self, input: CreateOrganizationInput) -> Option<Organization> {
        let result = self
            .client
            .mutate::<CreateOrganization>(&input)
            .await
            .and_then(Payload::into_record);
        let organization = log_failure("creating organization", result)?;
        self.refetch_after(MutationKind::CreateOrganization, None)
            .await;
        Some(organization)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_organization(&self, input: UpdateOrganizationInput) -> Option<Organization> {
        let result = self
            .client
            .mutate::<UpdateOrganization>(&input)
            .await
            .and_then(Payload::into_record);
        let organization = log_failure("updating organization", result)?;

        if self
            .current_organization()
            .is_some_and(|current| current.id == organization.id)
        {
            if let Err(e) = self
                .client
                .preferences()
                .set_current_organization(&organization)
            {
                tracing::error!("Error saving updated organization: {}", e);
            }
        }
        self.refetch_after(MutationKind::UpdateOrganization, None)
            .await;
        Some(organization)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_organization(&self, id: &OrganizationId) -> bool {
        let result = self
            .client
            .mutate::<DeleteOrganization>(&IdVariables { id: id.clone() })
            .await
            .and_then(Payload::into_success);
        if log_failure("deleting organization", result).is_none() {
            return false;
        }

        self.client.evict("OrganizationType", id.as_str());
        if self
            .current_organization()
            .is_some_and(|current| &current.id == id)
        {
            self.clear_current_organization();
        }
        self.refetch_after(MutationKind::DeleteOrganization, None)
            .await;
        true
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_project(&self, input: CreateProjectInput) -> Option<Project> {
        let result = self
            .client
            .mutate::<CreateProject>(&input.sanitize())
            .await
            .and_then(Payload::into_record);
        let project = log_failure("creating project", result)?;
        self.refetch_after(MutationKind::CreateProject, None).await;
        Some(project)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_project(&self, input: UpdateProjectInput) -> Option<Project> {
        let result = self
            .client
            .mutate::<UpdateProject>(&input.sanitize())
            .await
            .and_then(Payload::into_record);
        let project = log_failure("updating project", result)?;
        self.refetch_after(MutationKind::UpdateProject, None).await;
        Some(project)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_project(&self, id: &ProjectId) -> bool {
        let result = self
            .client
            .mutate::<DeleteProject>(&IdVariables { id: id.clone() })
            .await
            .and_then(Payload::into_success);
        if log_failure("deleting project", result).is_none() {
            return false;
        }

        self.client.evict("ProjectType", id.as_str());
        self.refetch_after(MutationKind::DeleteProject, None).await;
        true
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, input: CreateTaskInput) -> Option<Task> {
        let result = self
            .client
            .mutate::<CreateTask>(&input.sanitize())
            .await
            .and_then(Payload::into_record);
        let task = log_failure("creating task", result)?;
        self.refetch_after(MutationKind::CreateTask, Some(&task.id))
            .await;
        Some(task)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, input: UpdateTaskInput) -> Option<Task> {
        let result = self
            .client
            .mutate::<UpdateTask>(&input.sanitize())
            .await
            .and_then(Payload::into_record);
        let task = log_failure("updating task", result)?;
        self.refetch_after(MutationKind::UpdateTask, Some(&task.id))
            .await;
        Some(task)
    }

    /// Moves a task to another board column.
    pub async fn move_task(&self, id: &TaskId, status: TaskStatus) -> Option<Task> {
        self.update_task(UpdateTaskInput::move_to(id.clone(), status))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: &TaskId) -> bool {
        let result = self
            .client
            .mutate::<DeleteTask>(&IdVariables { id: id.clone() })
            .await
            .and_then(Payload::into_success);
        if log_failure("deleting task", result).is_none() {
            return false;
        }

        self.client.evict("TaskType", id.as_str());
        self.state().comments.remove(id);
        self.refetch_after(MutationKind::DeleteTask, Some(id)).await;
        true
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_comment(&self, input: CreateCommentInput) -> Option<TaskComment> {
        let task_id = input.task_id.clone();
        let result = self
            .client
            .mutate::<CreateComment>(&input)
            .await
            .and_then(Payload::into_record);
        let comment = log_failure("creating comment", result)?;
        self.refetch_after(MutationKind::CreateComment, Some(&task_id))
            .await;
        Some(comment)
    }
}

fn log_failure<R>(action: &str, result: Result<R, ClientError>) -> Option<R> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Error {}: {}", action, e);
            None
        }
    }
}
