//! Bucket projection for the dashboard and kanban columns.

use serde::Serialize;

use crate::status::TaskStatus;
use crate::task::Task;

/// The three display columns. Every projected task lands in exactly one of them,
/// in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets<'a> {
    pub planned: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
    pub cancelled: Vec<&'a Task>,
}

/// Headline counts shown above the columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub planned: usize,
    pub completed: usize,
    pub cancelled: usize,
}

pub fn project(tasks: &[Task]) -> Buckets<'_> {
    let mut out = Buckets::default();
    for t in tasks {
        match t.status {
            TaskStatus::Planned => out.planned.push(t),
            TaskStatus::Done => out.completed.push(t),
            TaskStatus::Cancelled => out.cancelled.push(t),
        }
    }
    out
}

impl<'a> Buckets<'a> {
    pub fn bucket(&self, status: TaskStatus) -> &[&'a Task] {
        match status {
            TaskStatus::Planned => &self.planned,
            TaskStatus::Done => &self.completed,
            TaskStatus::Cancelled => &self.cancelled,
        }
    }

    pub fn len(&self) -> usize {
        self.planned.len() + self.completed.len() + self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.len(),
            planned: self.planned.len(),
            completed: self.completed.len(),
            cancelled: self.cancelled.len(),
        }
    }
}
