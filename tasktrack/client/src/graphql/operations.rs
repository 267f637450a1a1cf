//! Every GraphQL document the client sends, with its variables and result type.
//!
//! Each operation is a unit struct implementing [`Operation`]. Entity selections
//! always include `__typename` and `id` so the cache can normalize them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tasktrack_core::sanitize::{NewProject, NewTask, ProjectChanges, TaskChanges};
use tasktrack_core::{
    CreateCommentInput, CreateOrganizationInput, Organization, OrganizationId, Project, ProjectId,
    ProjectStats, ProjectStatus, Task, TaskComment, TaskId, TaskStatus, UpdateOrganizationInput,
};

use super::ClientError;

/// A GraphQL document together with the types flowing in and out of it.
pub trait Operation {
    type Variables: Serialize + Send + Sync;
    type Output: DeserializeOwned;

    /// The `operationName` sent with the request; also part of the cache key.
    const NAME: &'static str;
    const DOCUMENT: &'static str;
    /// Field of `data` holding the result.
    const ROOT: &'static str;
    /// Whether the result depends on the selected organization.
    const SCOPED: bool;
}

macro_rules! organization_fields {
    () => {
        "fragment OrganizationFields on OrganizationType {
  __typename
  id
  name
  slug
  contactEmail
  createdAt
  isActive
}
"
    };
}

macro_rules! project_fields {
    () => {
        "fragment ProjectFields on ProjectType {
  __typename
  id
  name
  description
  status
  dueDate
  createdAt
  updatedAt
  taskCount
  completedTasks
  completionRate
  isOverdue
  organization {
    __typename
    id
    name
    slug
  }
}
"
    };
}

macro_rules! task_fields {
    () => {
        "fragment TaskFields on TaskType {
  __typename
  id
  title
  description
  status
  priority
  assigneeEmail
  dueDate
  createdAt
  updatedAt
  isOverdue
  commentCount
  project {
    __typename
    id
    name
    organization {
      __typename
      id
      name
      slug
    }
  }
}
"
    };
}

macro_rules! comment_fields {
    () => {
        "fragment CommentFields on TaskCommentType {
  __typename
  id
  content
  authorEmail
  createdAt
  updatedAt
  task {
    __typename
    id
    title
  }
}
"
    };
}

macro_rules! operation {
    (
        $(#[$meta:meta])*
        $name:ident {
            name: $op:literal,
            root: $root:literal,
            scoped: $scoped:literal,
            variables: $vars:ty,
            output: $out:ty,
            document: $doc:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $name;

        impl Operation for $name {
            type Variables = $vars;
            type Output = $out;

            const NAME: &'static str = $op;
            const DOCUMENT: &'static str = $doc;
            const ROOT: &'static str = $root;
            const SCOPED: bool = $scoped;
        }
    };
}

/// Variables of operations that take none; serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdVariables<I> {
    pub id: I,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlugVariables {
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdVariables {
    pub task_id: TaskId,
}

/// Filter accepted by the `projects` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ProjectFilter {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }
}

/// Filter accepted by the `tasks` query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl TaskFilter {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Self::default()
        }
    }
}

/// The `{record, success, errors}` shape every mutation answers with.
///
/// `record` is read from whichever of `organization`, `project`, `task` or
/// `comment` the mutation returns.
#[derive(Debug, Clone, Deserialize)]
pub struct Payload<T> {
    #[serde(
        alias = "organization",
        alias = "project",
        alias = "task",
        alias = "comment"
    )]
    pub record: Option<T>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<T> Payload<T> {
    /// Checks the `success` flag, turning `false` into [`ClientError::Rejected`].
    pub fn into_success(self) -> Result<Option<T>, ClientError> {
        if self.success {
            Ok(self.record)
        } else {
            Err(ClientError::Rejected(self.errors))
        }
    }

    /// Like [`Payload::into_success`], but a successful payload must carry its record.
    pub fn into_record(self) -> Result<T, ClientError> {
        self.into_success()?.ok_or(ClientError::MissingField("record"))
    }
}

/// Deletes return no record.
pub type DeletePayload = Payload<Value>;

operation!(
    Organizations {
        name: "GetOrganizations",
        root: "organizations",
        scoped: false,
        variables: NoVariables,
        output: Vec<Organization>,
        document: concat!(
            "query GetOrganizations {
  organizations {
    ...OrganizationFields
  }
}
",
            organization_fields!()
        ),
    }
);

operation!(
    OrganizationBySlug {
        name: "GetOrganization",
        root: "organization",
        scoped: false,
        variables: SlugVariables,
        output: Option<Organization>,
        document: concat!(
            "query GetOrganization($slug: String!) {
  organization(slug: $slug) {
    ...OrganizationFields
  }
}
",
            organization_fields!()
        ),
    }
);

operation!(
    Projects {
        name: "GetProjects",
        root: "projects",
        scoped: true,
        variables: ProjectFilter,
        output: Vec<Project>,
        document: concat!(
            "query GetProjects($status: String, $search: String, $limit: Int, $offset: Int) {
  projects(status: $status, search: $search, limit: $limit, offset: $offset) {
    ...ProjectFields
  }
}
",
            project_fields!()
        ),
    }
);

operation!(
    ProjectById {
        name: "GetProject",
        root: "project",
        scoped: true,
        variables: IdVariables<ProjectId>,
        output: Option<Project>,
        document: concat!(
            "query GetProject($id: ID!) {
  project(id: $id) {
    ...ProjectFields
  }
}
",
            project_fields!()
        ),
    }
);

operation!(
    Tasks {
        name: "GetTasks",
        root: "tasks",
        scoped: true,
        variables: TaskFilter,
        output: Vec<Task>,
        document: concat!(
            "query GetTasks($projectId: ID, $status: String, $assigneeEmail: String, $search: String, $limit: Int, $offset: Int) {
  tasks(projectId: $projectId, status: $status, assigneeEmail: $assigneeEmail, search: $search, limit: $limit, offset: $offset) {
    ...TaskFields
  }
}
",
            task_fields!()
        ),
    }
);

operation!(
    TaskById {
        name: "GetTask",
        root: "task",
        scoped: true,
        variables: IdVariables<TaskId>,
        output: Option<Task>,
        document: concat!(
            "query GetTask($id: ID!) {
  task(id: $id) {
    ...TaskFields
  }
}
",
            task_fields!()
        ),
    }
);

operation!(
    TaskComments {
        name: "GetTaskComments",
        root: "taskComments",
        scoped: true,
        variables: TaskIdVariables,
        output: Vec<TaskComment>,
        document: concat!(
            "query GetTaskComments($taskId: ID!) {
  taskComments(taskId: $taskId) {
    ...CommentFields
  }
}
",
            comment_fields!()
        ),
    }
);

operation!(
    ProjectStatsQuery {
        name: "GetProjectStats",
        root: "projectStats",
        scoped: true,
        variables: NoVariables,
        output: Option<ProjectStats>,
        document: "query GetProjectStats {
  projectStats {
    totalProjects
    activeProjects
    completedProjects
    totalTasks
    completedTasks
    completionRate
  }
}
",
    }
);

operation!(
    CreateOrganization {
        name: "CreateOrganization",
        root: "createOrganization",
        scoped: false,
        variables: CreateOrganizationInput,
        output: Payload<Organization>,
        document: concat!(
            "mutation CreateOrganization($name: String!, $contactEmail: String!) {
  createOrganization(name: $name, contactEmail: $contactEmail) {
    organization {
      ...OrganizationFields
    }
    success
    errors
  }
}
",
            organization_fields!()
        ),
    }
);

operation!(
    UpdateOrganization {
        name: "UpdateOrganization",
        root: "updateOrganization",
        scoped: false,
        variables: UpdateOrganizationInput,
        output: Payload<Organization>,
        document: concat!(
            "mutation UpdateOrganization($id: ID!, $name: String, $contactEmail: String, $isActive: Boolean) {
  updateOrganization(id: $id, name: $name, contactEmail: $contactEmail, isActive: $isActive) {
    organization {
      ...OrganizationFields
    }
    success
    errors
  }
}
",
            organization_fields!()
        ),
    }
);

operation!(
    DeleteOrganization {
        name: "DeleteOrganization",
        root: "deleteOrganization",
        scoped: false,
        variables: IdVariables<OrganizationId>,
        output: DeletePayload,
        document: "mutation DeleteOrganization($id: ID!) {
  deleteOrganization(id: $id) {
    success
    errors
  }
}
",
    }
);

operation!(
    CreateProject {
        name: "CreateProject",
        root: "createProject",
        scoped: true,
        variables: NewProject,
        output: Payload<Project>,
        document: concat!(
            "mutation CreateProject($name: String!, $description: String, $status: String, $dueDate: DateTime) {
  createProject(name: $name, description: $description, status: $status, dueDate: $dueDate) {
    project {
      ...ProjectFields
    }
    success
    errors
  }
}
",
            project_fields!()
        ),
    }
);

operation!(
    UpdateProject {
        name: "UpdateProject",
        root: "updateProject",
        scoped: true,
        variables: ProjectChanges,
        output: Payload<Project>,
        document: concat!(
            "mutation UpdateProject($id: ID!, $name: String, $description: String, $status: String, $dueDate: DateTime) {
  updateProject(id: $id, name: $name, description: $description, status: $status, dueDate: $dueDate) {
    project {
      ...ProjectFields
    }
    success
    errors
  }
}
",
            project_fields!()
        ),
    }
);

operation!(
    DeleteProject {
        name: "DeleteProject",
        root: "deleteProject",
        scoped: true,
        variables: IdVariables<ProjectId>,
        output: DeletePayload,
        document: "mutation DeleteProject($id: ID!) {
  deleteProject(id: $id) {
    success
    errors
  }
}
",
    }
);

operation!(
    CreateTask {
        name: "CreateTask",
        root: "createTask",
        scoped: true,
        variables: NewTask,
        output: Payload<Task>,
        document: concat!(
            "mutation CreateTask($projectId: ID!, $title: String!, $description: String, $status: String, $priority: String, $assigneeEmail: String, $dueDate: DateTime) {
  createTask(projectId: $projectId, title: $title, description: $description, status: $status, priority: $priority, assigneeEmail: $assigneeEmail, dueDate: $dueDate) {
    task {
      ...TaskFields
    }
    success
    errors
  }
}
",
            task_fields!()
        ),
    }
);

operation!(
    UpdateTask {
        name: "UpdateTask",
        root: "updateTask",
        scoped: true,
        variables: TaskChanges,
        output: Payload<Task>,
        document: concat!(
            "mutation UpdateTask($id: ID!, $title: String, $description: String, $status: String, $priority: String, $assigneeEmail: String, $dueDate: DateTime) {
  updateTask(id: $id, title: $title, description: $description, status: $status, priority: $priority, assigneeEmail: $assigneeEmail, dueDate: $dueDate) {
    task {
      ...TaskFields
    }
    success
    errors
  }
}
",
            task_fields!()
        ),
    }
);

operation!(
    DeleteTask {
        name: "DeleteTask",
        root: "deleteTask",
        scoped: true,
        variables: IdVariables<TaskId>,
        output: DeletePayload,
        document: "mutation DeleteTask($id: ID!) {
  deleteTask(id: $id) {
    success
    errors
  }
}
",
    }
);

operation!(
    CreateComment {
        name: "CreateTaskComment",
        root: "createTaskComment",
        scoped: true,
        variables: CreateCommentInput,
        output: Payload<TaskComment>,
        document: concat!(
            "mutation CreateTaskComment($taskId: ID!, $content: String!, $authorEmail: String!) {
  createTaskComment(taskId: $taskId, content: $content, authorEmail: $authorEmail) {
    comment {
      ...CommentFields
    }
    success
    errors
  }
}
",
            comment_fields!()
        ),
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_variables_serialize_as_empty_object() {
        assert_eq!(serde_json::to_value(NoVariables {}).unwrap(), json!({}));
    }

    #[test]
    fn project_page_sends_limit_and_offset_only() {
        // Act
        let value = serde_json::to_value(ProjectFilter::page(50, 0)).unwrap();

        // Assert
        assert_eq!(value, json!({"limit": 50, "offset": 0}));
    }

    #[test]
    fn task_filter_uses_graphql_argument_names() {
        // Arrange
        let filter = TaskFilter {
            project_id: Some("7".into()),
            status: Some(TaskStatus::InProgress),
            assignee_email: Some("dev@acme.test".to_string()),
            ..TaskFilter::page(100, 0)
        };

        // Act
        let value = serde_json::to_value(filter).unwrap();

        // Assert
        assert_eq!(
            value,
            json!({
                "projectId": "7",
                "status": "IN_PROGRESS",
                "assigneeEmail": "dev@acme.test",
                "limit": 100,
                "offset": 0
            })
        );
    }

    #[test]
    fn payload_reads_record_from_entity_field() {
        // Arrange
        let value = json!({
            "comment": {"id": "9", "content": "hi", "authorEmail": "a@b.c",
                        "createdAt": "2024-05-01T10:00:00Z", "updatedAt": null,
                        "task": {"id": "3", "title": "Write docs"}},
            "success": true,
            "errors": []
        });

        // Act
        let payload: Payload<TaskComment> = serde_json::from_value(value).unwrap();
        let comment = payload.into_record().unwrap();

        // Assert
        assert_eq!(comment.id.as_str(), "9");
        assert_eq!(comment.task.id.as_str(), "3");
    }

    #[test]
    fn unsuccessful_payload_is_rejected_with_server_errors() {
        // Arrange
        let value = json!({"project": null, "success": false, "errors": ["Name is required"]});

        // Act
        let payload: Payload<Project> = serde_json::from_value(value).unwrap();

        // Assert
        match payload.into_record() {
            Err(ClientError::Rejected(errors)) => assert_eq!(errors, vec!["Name is required"]),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn payload_without_record_field_decodes_for_entities() {
        // Arrange
        let value = json!({"success": false, "errors": ["Slug already taken"]});

        // Act
        let payload: Payload<Organization> = serde_json::from_value(value).unwrap();

        // Assert
        assert!(payload.record.is_none());
        assert!(matches!(payload.into_record(), Err(ClientError::Rejected(_))));
    }

    #[test]
    fn successful_delete_has_no_record() {
        let payload: DeletePayload =
            serde_json::from_value(json!({"success": true, "errors": []})).unwrap();

        assert!(matches!(payload.into_success(), Ok(None)));
    }

    #[test]
    fn scoped_operations_are_marked() {
        assert!(!Organizations::SCOPED);
        assert!(!OrganizationBySlug::SCOPED);
        assert!(!CreateOrganization::SCOPED);
        assert!(Projects::SCOPED);
        assert!(Tasks::SCOPED);
        assert!(TaskComments::SCOPED);
        assert!(ProjectStatsQuery::SCOPED);
        assert!(CreateTask::SCOPED);
    }

    #[test]
    fn documents_include_their_fragments() {
        assert!(Projects::DOCUMENT.contains("fragment ProjectFields on ProjectType"));
        assert!(Tasks::DOCUMENT.contains("...TaskFields"));
        assert!(Tasks::DOCUMENT.contains("fragment TaskFields on TaskType"));
        assert!(CreateComment::DOCUMENT.contains("fragment CommentFields"));
        assert!(Organizations::DOCUMENT.starts_with("query GetOrganizations"));
    }

    #[test]
    fn entity_selections_request_typename() {
        for document in [
            Organizations::DOCUMENT,
            Projects::DOCUMENT,
            Tasks::DOCUMENT,
            TaskComments::DOCUMENT,
        ] {
            assert!(document.contains("__typename"), "missing __typename in {document}");
        }
    }
}
