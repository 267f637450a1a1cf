//! Kanban grouping of a project's tasks.
use crate::ids::ProjectId;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// Tasks laid out in one column per status, in [`TaskStatus::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub columns: Vec<Column>,
}

impl Board {
    /// Groups `tasks` by status. Relative order inside a column follows the input.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut columns: Vec<Column> = TaskStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                tasks: Vec::new(),
            })
            .collect();
        for task in tasks {
            if let Some(column) = columns.iter_mut().find(|c| c.status == task.status) {
                column.tasks.push(task.clone());
            }
        }
        Board { columns }
    }

    /// Board for the tasks of a single project.
    pub fn for_project(tasks: &[Task], project_id: &ProjectId) -> Self {
        Self::from_tasks(tasks.iter().filter(|task| task.project_id() == project_id))
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    /// Share of done tasks as a percentage; zero for an empty board.
    pub fn completion_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.column(TaskStatus::Done).len() as f64 / total as f64 * 100.0
    }
}
