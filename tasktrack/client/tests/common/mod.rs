#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard};
use tasktrack_client::graphql::{ClientError, GraphQlRequest, Transport};
use tasktrack_client::{DataService, Limits, MemoryPreferenceStore, RemoteClient};
use tasktrack_core::{Organization, ProjectId, TaskId};

pub const CREATED_AT: &str = "2024-01-01T09:00:00Z";

pub type TestService = DataService<FakeApi, MemoryPreferenceStore>;

pub fn setup() {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn service(api: &FakeApi) -> TestService {
    service_in(api, None)
}

pub fn service_in(api: &FakeApi, organization: Option<Organization>) -> TestService {
    let preferences = match organization {
        Some(organization) => MemoryPreferenceStore::with_organization(organization),
        None => MemoryPreferenceStore::new(),
    };
    DataService::new(RemoteClient::new(api.clone(), preferences), Limits::default())
}

#[derive(Default)]
struct Records {
    next_id: u32,
    organizations: Vec<Value>,
    /// (organization slug, project)
    projects: Vec<(String, Value)>,
    tasks: Vec<(String, Value)>,
    comments: Vec<(String, Value)>,
    failing: Vec<String>,
    rejecting: Vec<String>,
    /// (organization slug, scheduler turns to wait before answering)
    delays: Vec<(String, usize)>,
    requests: Vec<GraphQlRequest>,
}

/// An in-process stand-in for the API, partitioned by organization the way the
/// server partitions by the scope header.
#[derive(Clone, Default)]
pub struct FakeApi {
    records: Arc<Mutex<Records>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap()
    }

    pub fn add_organization(&self, name: &str, slug: &str) -> Organization {
        let mut records = self.records();
        let id = records.next_id();
        let organization = json!({
            "__typename": "OrganizationType",
            "id": id,
            "name": name,
            "slug": slug,
            "contactEmail": format!("team@{slug}.test"),
            "createdAt": CREATED_AT,
            "isActive": true,
        });
        records.organizations.push(organization.clone());
        serde_json::from_value(records.organization_view(&organization)).unwrap()
    }

    pub fn add_project(&self, slug: &str, name: &str) -> ProjectId {
        let mut records = self.records();
        let id = records.next_id();
        let organization = records.organization_ref(slug);
        records.projects.push((
            slug.to_string(),
            json!({
                "__typename": "ProjectType",
                "id": id,
                "name": name,
                "description": "",
                "status": "ACTIVE",
                "dueDate": null,
                "createdAt": CREATED_AT,
                "updatedAt": CREATED_AT,
                "isOverdue": false,
                "organization": organization,
            }),
        ));
        ProjectId::new(id)
    }

    pub fn add_task(&self, slug: &str, project: &ProjectId, title: &str) -> TaskId {
        self.add_task_with(slug, project, title, "TODO")
    }

    pub fn add_task_with(
        &self,
        slug: &str,
        project: &ProjectId,
        title: &str,
        status: &str,
    ) -> TaskId {
        let mut records = self.records();
        let id = records.next_id();
        records.tasks.push((
            slug.to_string(),
            json!({
                "__typename": "TaskType",
                "id": id,
                "title": title,
                "description": "",
                "status": status,
                "priority": "MEDIUM",
                "assigneeEmail": "",
                "dueDate": null,
                "createdAt": CREATED_AT,
                "updatedAt": CREATED_AT,
                "isOverdue": false,
                "project": {"__typename": "ProjectType", "id": project.as_str()},
            }),
        ));
        TaskId::new(id)
    }

    /// Makes every later request for `operation` fail with a GraphQL error.
    pub fn fail(&self, operation: &str) {
        self.records().failing.push(operation.to_string());
    }

    /// Makes every later `operation` mutation answer with `success: false`.
    pub fn reject(&self, operation: &str) {
        self.records().rejecting.push(operation.to_string());
    }

    /// Holds back every later answer for `slug` until the scheduler has run other
    /// tasks `turns` times.
    pub fn delay(&self, slug: &str, turns: usize) {
        self.records().delays.push((slug.to_string(), turns));
    }

    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.records().requests.clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.records()
            .requests
            .iter()
            .map(|request| request.operation_name)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.records().requests.clear();
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, ClientError> {
        let (response, turns) = {
            let mut records = self.records();
            records.requests.push(request.clone());
            (records.respond(&request), records.delay_for(request.scope.as_deref()))
        };
        for _ in 0..turns {
            tokio::task::yield_now().await;
        }
        response
    }
}

fn mutation_root(operation: &str) -> String {
    let mut chars = operation.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn text<'a>(variables: &'a Value, key: &str) -> Option<&'a str> {
    variables.get(key).and_then(Value::as_str)
}

fn field_is(record: &Value, key: &str, wanted: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| record[key].as_str() == Some(wanted))
}

fn page(records: Vec<Value>, variables: &Value) -> Vec<Value> {
    let offset = variables["offset"].as_u64().unwrap_or(0) as usize;
    let limit = variables["limit"].as_u64().map_or(usize::MAX, |limit| limit as usize);
    records.into_iter().skip(offset).take(limit).collect()
}

fn rejected(root: &str, error: &str) -> Result<Value, ClientError> {
    Ok(json!({root: {"success": false, "errors": [error]}}))
}

impl Records {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn respond(&mut self, request: &GraphQlRequest) -> Result<Value, ClientError> {
        let operation = request.operation_name;
        if self.failing.iter().any(|failing| failing == operation) {
            return Err(ClientError::GraphQl(vec![format!("{operation} failed")]));
        }
        if self.rejecting.iter().any(|rejecting| rejecting == operation) {
            let root = mutation_root(operation);
            return Ok(json!({root: {"success": false, "errors": ["Not allowed"]}}));
        }
        self.answer(operation, request.scope.as_deref(), &request.variables)
    }

    fn delay_for(&self, scope: Option<&str>) -> usize {
        self.delays
            .iter()
            .filter(|(slug, _)| Some(slug.as_str()) == scope)
            .map(|(_, turns)| *turns)
            .sum()
    }

    fn organization_ref(&self, slug: &str) -> Value {
        let organization = self
            .organizations
            .iter()
            .find(|organization| organization["slug"] == slug)
            .unwrap();
        json!({
            "__typename": "OrganizationType",
            "id": organization["id"],
            "name": organization["name"],
            "slug": slug,
        })
    }

    fn organization_view(&self, organization: &Value) -> Value {
        let slug = organization["slug"].as_str().unwrap_or_default();
        let mut view = organization.clone();
        view["projectCount"] = json!(self.projects.iter().filter(|(s, _)| s == slug).count());
        view["taskCount"] = json!(self.tasks.iter().filter(|(s, _)| s == slug).count());
        view
    }

    fn project_view(&self, project: &Value) -> Value {
        let tasks: Vec<&Value> = self
            .tasks
            .iter()
            .map(|(_, task)| task)
            .filter(|task| task["project"]["id"] == project["id"])
            .collect();
        let completed = tasks.iter().filter(|task| task["status"] == "DONE").count();
        let mut view = project.clone();
        view["taskCount"] = json!(tasks.len());
        view["completedTasks"] = json!(completed);
        view["completionRate"] = json!(rate(completed, tasks.len()));
        view
    }

    fn task_view(&self, task: &Value) -> Value {
        let mut view = task.clone();
        if let Some((_, project)) = self
            .projects
            .iter()
            .find(|(_, project)| project["id"] == task["project"]["id"])
        {
            view["project"]["name"] = project["name"].clone();
        }
        view["commentCount"] = json!(
            self.comments
                .iter()
                .filter(|(_, comment)| comment["task"]["id"] == task["id"])
                .count()
        );
        view
    }

    fn scoped<'a>(
        list: &'a [(String, Value)],
        scope: &'a str,
    ) -> impl Iterator<Item = &'a Value> {
        list.iter()
            .filter(move |(slug, _)| slug == scope)
            .map(|(_, record)| record)
    }

    fn position(list: &[(String, Value)], scope: &str, id: Option<&str>) -> Option<usize> {
        list.iter()
            .position(|(slug, record)| slug == scope && record["id"].as_str() == id)
    }

    fn answer(
        &mut self,
        operation: &str,
        scope: Option<&str>,
        variables: &Value,
    ) -> Result<Value, ClientError> {
        match operation {
            "GetOrganizations" => {
                let organizations: Vec<Value> = self
                    .organizations
                    .iter()
                    .map(|organization| self.organization_view(organization))
                    .collect();
                return Ok(json!({"organizations": organizations}));
            }
            "GetOrganization" => {
                let organization = self
                    .organizations
                    .iter()
                    .find(|organization| organization["slug"].as_str() == text(variables, "slug"))
                    .map(|organization| self.organization_view(organization));
                return Ok(json!({"organization": organization}));
            }
            "CreateOrganization" => {
                let id = self.next_id();
                let slug = text(variables, "name")
                    .unwrap_or_default()
                    .to_lowercase()
                    .replace(' ', "-");
                let organization = json!({
                    "__typename": "OrganizationType",
                    "id": id,
                    "name": variables["name"],
                    "slug": slug,
                    "contactEmail": variables["contactEmail"],
                    "createdAt": CREATED_AT,
                    "isActive": true,
                });
                self.organizations.push(organization.clone());
                let view = self.organization_view(&organization);
                return Ok(json!({"createOrganization": {
                    "organization": view, "success": true, "errors": []
                }}));
            }
            "UpdateOrganization" => {
                let Some(organization) = self
                    .organizations
                    .iter_mut()
                    .find(|organization| organization["id"].as_str() == text(variables, "id"))
                else {
                    return rejected("updateOrganization", "Organization not found");
                };
                for key in ["name", "contactEmail", "isActive"] {
                    if let Some(value) = variables.get(key) {
                        organization[key] = value.clone();
                    }
                }
                let organization = organization.clone();
                let view = self.organization_view(&organization);
                return Ok(json!({"updateOrganization": {
                    "organization": view, "success": true, "errors": []
                }}));
            }
            "DeleteOrganization" => {
                let before = self.organizations.len();
                self.organizations
                    .retain(|organization| organization["id"].as_str() != text(variables, "id"));
                if before == self.organizations.len() {
                    return rejected("deleteOrganization", "Organization not found");
                }
                return Ok(json!({"deleteOrganization": {"success": true, "errors": []}}));
            }
            _ => {}
        }

        let Some(scope) = scope else {
            return Err(ClientError::GraphQl(vec![
                "Organization context required".to_string(),
            ]));
        };

        match operation {
            "GetProjects" => {
                let search = text(variables, "search").map(str::to_lowercase);
                let projects: Vec<Value> = Self::scoped(&self.projects, scope)
                    .filter(|project| field_is(project, "status", text(variables, "status")))
                    .filter(|project| {
                        search.as_deref().is_none_or(|search| {
                            project["name"]
                                .as_str()
                                .is_some_and(|name| name.to_lowercase().contains(search))
                        })
                    })
                    .map(|project| self.project_view(project))
                    .collect();
                Ok(json!({"projects": page(projects, variables)}))
            }
            "GetProject" => {
                let project = Self::position(&self.projects, scope, text(variables, "id"))
                    .map(|index| self.project_view(&self.projects[index].1));
                Ok(json!({"project": project}))
            }
            "GetTasks" => {
                let search = text(variables, "search").map(str::to_lowercase);
                let tasks: Vec<Value> = Self::scoped(&self.tasks, scope)
                    .filter(|task| {
                        text(variables, "projectId")
                            .is_none_or(|project| task["project"]["id"].as_str() == Some(project))
                    })
                    .filter(|task| field_is(task, "status", text(variables, "status")))
                    .filter(|task| field_is(task, "assigneeEmail", text(variables, "assigneeEmail")))
                    .filter(|task| {
                        search.as_deref().is_none_or(|search| {
                            task["title"]
                                .as_str()
                                .is_some_and(|title| title.to_lowercase().contains(search))
                        })
                    })
                    .map(|task| self.task_view(task))
                    .collect();
                Ok(json!({"tasks": page(tasks, variables)}))
            }
            "GetTask" => {
                let task = Self::position(&self.tasks, scope, text(variables, "id"))
                    .map(|index| self.task_view(&self.tasks[index].1));
                Ok(json!({"task": task}))
            }
            "GetTaskComments" => {
                let comments: Vec<Value> = Self::scoped(&self.comments, scope)
                    .filter(|comment| comment["task"]["id"].as_str() == text(variables, "taskId"))
                    .cloned()
                    .collect();
                Ok(json!({"taskComments": comments}))
            }
            "GetProjectStats" => {
                let projects: Vec<&Value> = Self::scoped(&self.projects, scope).collect();
                let tasks: Vec<&Value> = Self::scoped(&self.tasks, scope).collect();
                let completed_tasks = tasks.iter().filter(|task| task["status"] == "DONE").count();
                Ok(json!({"projectStats": {
                    "totalProjects": projects.len(),
                    "activeProjects": projects.iter().filter(|p| p["status"] == "ACTIVE").count(),
                    "completedProjects": projects.iter().filter(|p| p["status"] == "COMPLETED").count(),
                    "totalTasks": tasks.len(),
                    "completedTasks": completed_tasks,
                    "completionRate": rate(completed_tasks, tasks.len()),
                }}))
            }
            "CreateProject" => {
                let id = self.next_id();
                let organization = self.organization_ref(scope);
                let project = json!({
                    "__typename": "ProjectType",
                    "id": id,
                    "name": variables["name"],
                    "description": variables["description"],
                    "status": variables["status"],
                    "dueDate": calendar_day(&variables["dueDate"]),
                    "createdAt": CREATED_AT,
                    "updatedAt": CREATED_AT,
                    "isOverdue": false,
                    "organization": organization,
                });
                self.projects.push((scope.to_string(), project.clone()));
                let view = self.project_view(&project);
                Ok(json!({"createProject": {"project": view, "success": true, "errors": []}}))
            }
            "UpdateProject" => {
                let Some(index) = Self::position(&self.projects, scope, text(variables, "id")) else {
                    return rejected("updateProject", "Project not found");
                };
                let project = &mut self.projects[index].1;
                for key in ["name", "description", "status"] {
                    if let Some(value) = variables.get(key) {
                        project[key] = value.clone();
                    }
                }
                if let Some(due) = variables.get("dueDate") {
                    project["dueDate"] = calendar_day(due);
                }
                let project = project.clone();
                let view = self.project_view(&project);
                Ok(json!({"updateProject": {"project": view, "success": true, "errors": []}}))
            }
            "DeleteProject" => {
                let Some(index) = Self::position(&self.projects, scope, text(variables, "id")) else {
                    return rejected("deleteProject", "Project not found");
                };
                let (_, project) = self.projects.remove(index);
                self.tasks.retain(|(_, task)| task["project"]["id"] != project["id"]);
                Ok(json!({"deleteProject": {"success": true, "errors": []}}))
            }
            "CreateTask" => {
                if Self::position(&self.projects, scope, text(variables, "projectId")).is_none() {
                    return rejected("createTask", "Project not found");
                }
                let id = self.next_id();
                let task = json!({
                    "__typename": "TaskType",
                    "id": id,
                    "title": variables["title"],
                    "description": variables["description"],
                    "status": variables["status"],
                    "priority": variables["priority"],
                    "assigneeEmail": variables["assigneeEmail"],
                    "dueDate": variables["dueDate"],
                    "createdAt": CREATED_AT,
                    "updatedAt": CREATED_AT,
                    "isOverdue": false,
                    "project": {"__typename": "ProjectType", "id": variables["projectId"]},
                });
                self.tasks.push((scope.to_string(), task.clone()));
                let view = self.task_view(&task);
                Ok(json!({"createTask": {"task": view, "success": true, "errors": []}}))
            }
            "UpdateTask" => {
                let Some(index) = Self::position(&self.tasks, scope, text(variables, "id")) else {
                    return rejected("updateTask", "Task not found");
                };
                let task = &mut self.tasks[index].1;
                let fields = ["title", "description", "status", "priority", "assigneeEmail", "dueDate"];
                for key in fields {
                    if let Some(value) = variables.get(key) {
                        task[key] = value.clone();
                    }
                }
                let task = task.clone();
                let view = self.task_view(&task);
                Ok(json!({"updateTask": {"task": view, "success": true, "errors": []}}))
            }
            "DeleteTask" => {
                let Some(index) = Self::position(&self.tasks, scope, text(variables, "id")) else {
                    return rejected("deleteTask", "Task not found");
                };
                let (_, task) = self.tasks.remove(index);
                self.comments.retain(|(_, comment)| comment["task"]["id"] != task["id"]);
                Ok(json!({"deleteTask": {"success": true, "errors": []}}))
            }
            "CreateTaskComment" => {
                let Some(index) = Self::position(&self.tasks, scope, text(variables, "taskId")) else {
                    return rejected("createTaskComment", "Task not found");
                };
                let task = &self.tasks[index].1;
                let task_ref = json!({
                    "__typename": "TaskType", "id": task["id"], "title": task["title"]
                });
                let id = self.next_id();
                let comment = json!({
                    "__typename": "TaskCommentType",
                    "id": id,
                    "content": variables["content"],
                    "authorEmail": variables["authorEmail"],
                    "createdAt": CREATED_AT,
                    "updatedAt": CREATED_AT,
                    "task": task_ref,
                });
                self.comments.push((scope.to_string(), comment.clone()));
                Ok(json!({"createTaskComment": {
                    "comment": comment, "success": true, "errors": []
                }}))
            }
            other => Err(ClientError::GraphQl(vec![format!("Unknown operation {other}")])),
        }
    }
}

fn rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Projects store a calendar day; the time part of a submitted due date is dropped.
fn calendar_day(due: &Value) -> Value {
    match due.as_str() {
        Some(due) => json!(due.get(..10).unwrap_or(due)),
        None => Value::Null,
    }
}
