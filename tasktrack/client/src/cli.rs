//! Command-line front end over [`DataService`].

use crate::graphql::Transport;
use crate::graphql::operations::{ProjectFilter, TaskFilter};
use crate::preferences::PreferenceStore;
use crate::service::{DataService, Loadable};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use tasktrack_core::{
    Board, CreateCommentInput, CreateOrganizationInput, CreateProjectInput, CreateTaskInput,
    Organization, Patch, Project, ProjectId, ProjectStats, ProjectStatus, Task, TaskComment,
    TaskId, TaskPriority, TaskStatus, UpdateProjectInput, UpdateTaskInput,
};

const NO_ORGANIZATION: &str = "No organization selected. Run `tasktrack orgs use <slug>` first.";

#[derive(Parser, Debug)]
#[command(name = "tasktrack", version, about = "Projects and tasks from the terminal")]
pub struct Cli {
    /// GraphQL endpoint to talk to, overriding the configured one
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
    /// Use the development profile (separate config and preferences)
    #[arg(long, global = true)]
    pub dev: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Organizations and the current selection
    #[command(subcommand)]
    Orgs(OrgCommands),
    /// Projects of the selected organization
    #[command(subcommand)]
    Projects(ProjectCommands),
    /// Tasks of the selected organization
    #[command(subcommand)]
    Tasks(TaskCommands),
    /// Comments on a task
    #[command(subcommand)]
    Comments(CommentCommands),
    /// A project's tasks grouped by status
    Board { project: String },
    /// Totals for the selected organization
    Stats,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OrgCommands {
    List,
    /// Select the organization subsequent commands work in
    Use { slug: String },
    Current,
    Clear,
    Create {
        name: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommands {
    List {
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM
        #[arg(long)]
        due: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommands {
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Create {
        project: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<String>,
        #[arg(long)]
        unassign: bool,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Move a task to another board column
    Move { id: String, status: TaskStatus },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CommentCommands {
    List {
        task: String,
    },
    Add {
        task: String,
        content: String,
        #[arg(long)]
        author: String,
    },
}

pub async fn run<T: Transport, P: PreferenceStore>(
    command: Commands,
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Orgs(command) => run_orgs(command, service, out).await,
        Commands::Stats => {
            if !in_scope(service, out)? {
                return Ok(());
            }
            service.refetch_stats().await;
            let stats = loaded(service.project_stats(), "project stats")?;
            write_stats(out, &stats.unwrap_or_default())
        }
        Commands::Board { project } => {
            if !in_scope(service, out)? {
                return Ok(());
            }
            service.refetch_tasks().await;
            loaded(service.tasks(), "tasks")?;
            write_board(out, &service.board(&ProjectId::from(project)))
        }
        Commands::Projects(command) => {
            if !in_scope(service, out)? {
                return Ok(());
            }
            run_projects(command, service, out).await
        }
        Commands::Tasks(command) => {
            if !in_scope(service, out)? {
                return Ok(());
            }
            run_tasks(command, service, out).await
        }
        Commands::Comments(command) => {
            if !in_scope(service, out)? {
                return Ok(());
            }
            run_comments(command, service, out).await
        }
    }
}

fn in_scope<T: Transport, P: PreferenceStore>(
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    if service.current_organization().is_some() {
        return Ok(true);
    }
    writeln!(out, "{}", NO_ORGANIZATION)?;
    Ok(false)
}

fn loaded<D>(snapshot: Loadable<D>, what: &str) -> anyhow::Result<D> {
    match snapshot.error {
        Some(error) => bail!("Could not load {}: {}", what, error),
        None => Ok(snapshot.data),
    }
}

async fn run_orgs<T: Transport, P: PreferenceStore>(
    command: OrgCommands,
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        OrgCommands::List => {
            service.refetch_organizations().await;
            let organizations = loaded(service.organizations(), "organizations")?;
            let current = service.current_organization().map(|o| o.id);
            if organizations.is_empty() {
                writeln!(out, "No organizations.")?;
            }
            for organization in &organizations {
                let marker = if current.as_ref() == Some(&organization.id) { "*" } else { " " };
                writeln!(out, "{} {}", marker, organization_line(organization))?;
            }
        }
        OrgCommands::Use { slug } => {
            service.refetch_organizations().await;
            let Some(organization) = service.select_organization(&slug).await else {
                bail!("No organization with slug '{}'", slug);
            };
            writeln!(out, "Now working in {} ({})", organization.name, organization.slug)?;
        }
        OrgCommands::Current => match service.current_organization() {
            Some(organization) => writeln!(out, "{}", organization_line(&organization))?,
            None => writeln!(out, "No organization selected.")?,
        },
        OrgCommands::Clear => {
            if !service.clear_current_organization() {
                bail!("Could not clear the selected organization");
            }
            writeln!(out, "Organization selection cleared.")?;
        }
        OrgCommands::Create { name, email } => {
            let input = CreateOrganizationInput {
                name,
                contact_email: email,
            };
            let organization = service
                .create_organization(input)
                .await
                .context("Could not create organization")?;
            writeln!(out, "Created {}", organization_line(&organization))?;
        }
    }
    Ok(())
}

async fn run_projects<T: Transport, P: PreferenceStore>(
    command: ProjectCommands,
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        ProjectCommands::List { status, search } => {
            let projects = if status.is_none() && search.is_none() {
                service.refetch_projects().await;
                loaded(service.projects(), "projects")?
            } else {
                let filter = ProjectFilter {
                    status,
                    search,
                    ..ProjectFilter::page(service.limits().projects, 0)
                };
                service.search_projects(filter).await
            };
            if projects.is_empty() {
                writeln!(out, "No projects.")?;
            }
            for project in &projects {
                writeln!(out, "{}", project_line(project))?;
            }
        }
        ProjectCommands::Show { id } => {
            let project = service
                .project(&ProjectId::from(id.as_str()))
                .await
                .with_context(|| format!("Project {} not found", id))?;
            write_project(out, &project)?;
        }
        ProjectCommands::Create {
            name,
            description,
            status,
            due,
        } => {
            let input = CreateProjectInput {
                name,
                description,
                status,
                due_date: due,
            };
            let project = service
                .create_project(input)
                .await
                .context("Could not create project")?;
            writeln!(out, "Created {}", project_line(&project))?;
        }
        ProjectCommands::Update {
            id,
            name,
            description,
            status,
            due,
            clear_due,
        } => {
            let input = UpdateProjectInput {
                name,
                description: description.map(Patch::Set).unwrap_or_default(),
                status,
                due_date: date_patch(due, clear_due),
                ..UpdateProjectInput::new(id.as_str())
            };
            let project = service
                .update_project(input)
                .await
                .with_context(|| format!("Could not update project {}", id))?;
            writeln!(out, "Updated {}", project_line(&project))?;
        }
        ProjectCommands::Delete { id } => {
            if !service.delete_project(&ProjectId::from(id.as_str())).await {
                bail!("Could not delete project {}", id);
            }
            writeln!(out, "Deleted project {}", id)?;
        }
    }
    Ok(())
}

async fn run_tasks<T: Transport, P: PreferenceStore>(
    command: TaskCommands,
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        TaskCommands::List {
            project,
            status,
            assignee,
            search,
        } => {
            let tasks = if status.is_none() && assignee.is_none() && search.is_none() {
                service.refetch_tasks().await;
                let tasks = loaded(service.tasks(), "tasks")?;
                match project {
                    Some(project) => service.tasks_by_project(&ProjectId::from(project)),
                    None => tasks,
                }
            } else {
                let filter = TaskFilter {
                    project_id: project.map(ProjectId::from),
                    status,
                    assignee_email: assignee,
                    search,
                    ..TaskFilter::page(service.limits().tasks, 0)
                };
                service.search_tasks(filter).await
            };
            if tasks.is_empty() {
                writeln!(out, "No tasks.")?;
            }
            for task in &tasks {
                writeln!(out, "{}", task_line(task))?;
            }
        }
        TaskCommands::Show { id } => {
            let task_id = TaskId::from(id.as_str());
            let task = service
                .task(&task_id)
                .await
                .with_context(|| format!("Task {} not found", id))?;
            service.load_comments(&task_id).await;
            write_task(out, &task, &service.comments_by_task(&task_id))?;
        }
        TaskCommands::Create {
            project,
            title,
            description,
            status,
            priority,
            assignee,
            due,
        } => {
            let input = CreateTaskInput {
                description,
                status,
                priority,
                assignee_email: assignee,
                due_date: due,
                ..CreateTaskInput::new(project, title)
            };
            let task = service
                .create_task(input)
                .await
                .context("Could not create task")?;
            writeln!(out, "Created {}", task_line(&task))?;
        }
        TaskCommands::Update {
            id,
            title,
            description,
            status,
            priority,
            assignee,
            unassign,
            due,
            clear_due,
        } => {
            let assignee_email = match (assignee, unassign) {
                (_, true) => Patch::Clear,
                (Some(email), false) => Patch::Set(email),
                (None, false) => Patch::Unchanged,
            };
            let input = UpdateTaskInput {
                title,
                description: description.map(Patch::Set).unwrap_or_default(),
                status,
                priority,
                assignee_email,
                due_date: date_patch(due, clear_due),
                ..UpdateTaskInput::new(id.as_str())
            };
            let task = service
                .update_task(input)
                .await
                .with_context(|| format!("Could not update task {}", id))?;
            writeln!(out, "Updated {}", task_line(&task))?;
        }
        TaskCommands::Move { id, status } => {
            let task = service
                .move_task(&TaskId::from(id.as_str()), status)
                .await
                .with_context(|| format!("Could not move task {}", id))?;
            writeln!(out, "Moved {} to {}", task.title, task.status.label())?;
        }
        TaskCommands::Delete { id } => {
            if !service.delete_task(&TaskId::from(id.as_str())).await {
                bail!("Could not delete task {}", id);
            }
            writeln!(out, "Deleted task {}", id)?;
        }
    }
    Ok(())
}

async fn run_comments<T: Transport, P: PreferenceStore>(
    command: CommentCommands,
    service: &DataService<T, P>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        CommentCommands::List { task } => {
            let task_id = TaskId::from(task);
            service.load_comments(&task_id).await;
            let comments = loaded(service.comments(&task_id), "comments")?;
            if comments.is_empty() {
                writeln!(out, "No comments.")?;
            }
            for comment in &comments {
                writeln!(out, "{}", comment_line(comment))?;
            }
        }
        CommentCommands::Add {
            task,
            content,
            author,
        } => {
            let input = CreateCommentInput {
                task_id: TaskId::from(task),
                content,
                author_email: author,
            };
            let comment = service
                .create_comment(input)
                .await
                .context("Could not add comment")?;
            writeln!(out, "Added {}", comment_line(&comment))?;
        }
    }
    Ok(())
}

fn date_patch(due: Option<String>, clear: bool) -> Patch<String> {
    match (due, clear) {
        (_, true) => Patch::Clear,
        (Some(due), false) => Patch::Set(due),
        (None, false) => Patch::Unchanged,
    }
}

fn organization_line(organization: &Organization) -> String {
    format!(
        "{} ({}) <{}>",
        organization.name, organization.slug, organization.contact_email
    )
}

fn project_line(project: &Project) -> String {
    let due = project
        .due_date
        .map(|date| format!(" due {}", date.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "[{}] {} {} ({}/{} tasks){}{}",
        project.id,
        project.name,
        project.status,
        project.completed_tasks,
        project.task_count,
        due,
        if project.is_overdue { " OVERDUE" } else { "" }
    )
}

fn task_line(task: &Task) -> String {
    let assignee = task
        .assignee()
        .map(|email| format!(" @{}", email))
        .unwrap_or_default();
    let due = task
        .due_date
        .map(|date| format!(" due {}", date.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    format!(
        "[{}] {} ({}, {}){}{}{}",
        task.id,
        task.title,
        task.status.label(),
        task.priority,
        assignee,
        due,
        if task.is_overdue { " OVERDUE" } else { "" }
    )
}

fn comment_line(comment: &TaskComment) -> String {
    format!(
        "{} {}: {}",
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.author_email,
        comment.content
    )
}

fn write_project(out: &mut impl Write, project: &Project) -> anyhow::Result<()> {
    writeln!(out, "{}", project.name)?;
    writeln!(out, "  id:           {}", project.id)?;
    writeln!(out, "  organization: {}", project.organization.name)?;
    writeln!(out, "  status:       {}", project.status)?;
    if let Some(due) = project.due_date {
        writeln!(out, "  due:          {}", due.format("%Y-%m-%d"))?;
    }
    writeln!(
        out,
        "  progress:     {}/{} tasks ({:.1}%)",
        project.completed_tasks, project.task_count, project.completion_rate
    )?;
    if !project.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", project.description)?;
    }
    Ok(())
}

fn write_task(out: &mut impl Write, task: &Task, comments: &[TaskComment]) -> anyhow::Result<()> {
    writeln!(out, "{}", task.title)?;
    writeln!(out, "  id:       {}", task.id)?;
    writeln!(out, "  project:  {}", task.project.name)?;
    writeln!(out, "  status:   {}", task.status.label())?;
    writeln!(out, "  priority: {}", task.priority)?;
    writeln!(out, "  assignee: {}", task.assignee().unwrap_or("unassigned"))?;
    if let Some(due) = task.due_date {
        writeln!(out, "  due:      {}", due.format("%Y-%m-%d %H:%M"))?;
    }
    if !task.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", task.description)?;
    }
    if !comments.is_empty() {
        writeln!(out)?;
        for comment in comments {
            writeln!(out, "  {}", comment_line(comment))?;
        }
    }
    Ok(())
}

fn write_board(out: &mut impl Write, board: &Board) -> anyhow::Result<()> {
    for column in &board.columns {
        writeln!(out, "{} ({})", column.status.label(), column.tasks.len())?;
        for task in &column.tasks {
            writeln!(out, "  [{}] {} ({})", task.id, task.title, task.priority)?;
        }
    }
    Ok(())
}

fn write_stats(out: &mut impl Write, stats: &ProjectStats) -> anyhow::Result<()> {
    writeln!(
        out,
        "Projects: {} total, {} active, {} completed",
        stats.total_projects, stats.active_projects, stats.completed_projects
    )?;
    writeln!(
        out,
        "Tasks:    {} total, {} completed ({:.1}%)",
        stats.total_tasks, stats.completed_tasks, stats.completion_rate
    )?;
    Ok(())
}
