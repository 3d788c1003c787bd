//! Task status taxonomy and the user actions that move a task between states.
//!
//! The backend has used several spellings over time (`Pending`, `Completed`, missing
//! values). Everything is normalized to [`TaskStatus`] when a task is ingested, so
//! nothing downstream of `wire` ever compares strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Initial state. Also what absent/null/`Pending` statuses normalize to.
    #[default]
    Planned,
    /// Visit completed. Legacy spelling: `Completed`.
    Done,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task status: {0:?}")]
pub struct StatusParseError(pub String);

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Planned, TaskStatus::Done, TaskStatus::Cancelled];

    /// Canonical spelling sent to the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Planned => "Planned",
            TaskStatus::Done => "Done",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Column heading used by the dashboard.
    pub fn bucket_label(self) -> &'static str {
        match self {
            TaskStatus::Planned => "Planned",
            TaskStatus::Done => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = StatusParseError;

    /// Strict parse: accepts canonical names and legacy aliases (trimmed,
    /// case-insensitive), and an empty string as `Planned`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "planned" | "pending" => Ok(TaskStatus::Planned),
            "done" | "completed" => Ok(TaskStatus::Done),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// A user-initiated transition, as offered on a task card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Complete,
    Revert,
    Cancel,
}

impl Action {
    pub fn target(self) -> TaskStatus {
        match self {
            Action::Complete => TaskStatus::Done,
            Action::Revert => TaskStatus::Planned,
            Action::Cancel => TaskStatus::Cancelled,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Complete => "complete",
            Action::Revert => "revert",
            Action::Cancel => "cancel",
        }
    }

    /// Actions a card in `status` offers, in display order.
    ///
    /// There is deliberately no revert from `Cancelled`; the backend would accept it,
    /// but the console only offers `Complete` there.
    pub fn available_for(status: TaskStatus) -> &'static [Action] {
        match status {
            TaskStatus::Planned => &[Action::Complete, Action::Cancel],
            TaskStatus::Done => &[Action::Revert, Action::Cancel],
            TaskStatus::Cancelled => &[Action::Complete],
        }
    }

    pub fn is_offered_from(self, status: TaskStatus) -> bool {
        Action::available_for(status).contains(&self)
    }
}
