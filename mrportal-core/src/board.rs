//! TaskBoard: the loaded schedule for one (subject, date) and its transition state.
//!
//! - Tasks are kept in fetch order with an `activity_id -> position` index.
//! - Each load replaces everything and bumps `generation`, so a status update that
//!   settles after the user moved to another day cannot touch the new task set.
//! - Per-task `processing` markers record the status a task is moving to while its
//!   backend call is in flight. At most one transition per task at a time.

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::projection::{project, Buckets};
use crate::status::{Action, TaskStatus};
use crate::task::{dedupe_by_id, Task};

pub const TRANSITION_FAILED: &str = "Failed to update task status";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no activity '{0}' in the loaded schedule")]
    UnknownTask(String),
    #[error("the schedule for {0} is read-only; only today's schedule can be changed")]
    ReadOnly(String),
    #[error("activity '{0}' already has a status update in flight")]
    InFlight(String),
}

/// An applied-but-unconfirmed status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub activity_id: String,
    pub previous: TaskStatus,
    pub target: TaskStatus,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Task already has the requested status. Nothing was marked or sent.
    NoOp,
    Started(PendingTransition),
}

#[derive(Debug, Default, Clone)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
    date: Option<String>,
    editable: bool,
    processing: HashMap<String, TaskStatus>,
    error: Option<String>,
    generation: u64,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole task set with a fresh load for `date`.
    pub fn replace(&mut self, date: impl Into<String>, tasks: Vec<Task>, editable: bool) {
        self.tasks = dedupe_by_id(tasks);
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.activity_id.clone(), i))
            .collect();
        self.date = Some(date.into());
        self.editable = editable;
        self.processing.clear();
        self.error = None;
        self.generation += 1;
    }

    /// Drop everything (logout, subject change without a new load).
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.index.clear();
        self.date = None;
        self.editable = false;
        self.processing.clear();
        self.error = None;
        self.generation += 1;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, activity_id: &str) -> Option<&Task> {
        self.index.get(activity_id).map(|&i| &self.tasks[i])
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn project(&self) -> Buckets<'_> {
        project(&self.tasks)
    }

    /// Status a task is currently moving to, if a backend call is in flight.
    pub fn processing(&self, activity_id: &str) -> Option<TaskStatus> {
        self.processing.get(activity_id).copied()
    }

    pub fn is_processing(&self, activity_id: &str) -> bool {
        self.processing.contains_key(activity_id)
    }

    pub fn any_processing(&self) -> bool {
        !self.processing.is_empty()
    }

    /// Controls to render on a card. Empty on read-only boards and while the
    /// task's own update is in flight.
    pub fn controls_for(&self, activity_id: &str) -> &'static [Action] {
        if !self.editable || self.is_processing(activity_id) {
            return &[];
        }
        match self.get(activity_id) {
            Some(t) => Action::available_for(t.status),
            None => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Mark `activity_id` as processing and apply `target` locally.
    pub fn begin_transition(
        &mut self,
        activity_id: &str,
        target: TaskStatus,
    ) -> Result<Transition, TransitionError> {
        let Some(&pos) = self.index.get(activity_id) else {
            return Err(TransitionError::UnknownTask(activity_id.to_string()));
        };
        if !self.editable {
            let date = self.date.clone().unwrap_or_default();
            return Err(TransitionError::ReadOnly(date));
        }
        if self.processing.contains_key(activity_id) {
            return Err(TransitionError::InFlight(activity_id.to_string()));
        }

        let task = &mut self.tasks[pos];
        if task.status == target {
            debug!(activity_id, status = %target, "transition is a no-op");
            return Ok(Transition::NoOp);
        }

        let previous = task.status;
        task.status = target;
        self.processing.insert(activity_id.to_string(), target);

        Ok(Transition::Started(PendingTransition {
            activity_id: activity_id.to_string(),
            previous,
            target,
            generation: self.generation,
        }))
    }

    /// Backend rejected the change: surface the error and put the prior status back.
    ///
    /// Returns whether a rollback happened. Nothing is restored, and no error is set,
    /// when the board has been reloaded since. A task that no longer holds the
    /// optimistic value is left as is.
    pub fn fail_transition(&mut self, pending: &PendingTransition) -> bool {
        if pending.generation != self.generation {
            debug!(activity_id = %pending.activity_id, "board reloaded; skipping rollback");
            return false;
        }
        self.error = Some(TRANSITION_FAILED.to_string());
        let restored = self.restore(pending);
        if restored {
            warn!(
                activity_id = %pending.activity_id,
                restored = %pending.previous,
                attempted = %pending.target,
                "status update failed; rolled back"
            );
        }
        restored
    }

    /// The request was dropped before the backend answered. Put the prior status back
    /// without reporting an error.
    pub fn abandon(&mut self, pending: &PendingTransition) -> bool {
        if pending.generation != self.generation {
            return false;
        }
        let restored = self.restore(pending);
        if restored {
            debug!(
                activity_id = %pending.activity_id,
                restored = %pending.previous,
                "status update abandoned; rolled back"
            );
        }
        restored
    }

    fn restore(&mut self, pending: &PendingTransition) -> bool {
        let Some(&pos) = self.index.get(&pending.activity_id) else {
            return false;
        };
        let task = &mut self.tasks[pos];
        if task.status != pending.target {
            return false;
        }
        task.status = pending.previous;
        true
    }

    /// Clear the processing marker for a settled transition.
    pub fn release(&mut self, pending: &PendingTransition) {
        if pending.generation == self.generation {
            self.processing.remove(&pending.activity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(editable: bool) -> TaskBoard {
        let mut b = TaskBoard::new();
        b.replace(
            "2026-02-19",
            vec![
                Task::new("a", "Shah Clinic"),
                Task::new("b", "Patel Pharmacy").with_status(TaskStatus::Done),
                Task::new("c", "City Hospital").with_status(TaskStatus::Cancelled),
            ],
            editable,
        );
        b
    }

    fn started(t: Transition) -> PendingTransition {
        match t {
            Transition::Started(p) => p,
            Transition::NoOp => panic!("expected a started transition"),
        }
    }

    #[test]
    fn complete_from_cancelled_moves_bucket() {
        let mut b = board(true);
        let p = started(b.begin_transition("c", TaskStatus::Done).unwrap());
        assert_eq!(p.previous, TaskStatus::Cancelled);
        assert!(b.is_processing("c"));

        let buckets = b.project();
        assert!(buckets.completed.iter().any(|t| t.activity_id == "c"));
        assert!(buckets.cancelled.is_empty());

        b.release(&p);
        assert!(!b.is_processing("c"));
        assert_eq!(b.get("c").unwrap().status, TaskStatus::Done);
    }

    #[test]
    fn same_status_is_noop() {
        let mut b = board(true);
        assert_eq!(b.begin_transition("b", TaskStatus::Done).unwrap(), Transition::NoOp);
        assert!(!b.is_processing("b"));
        assert_eq!(b.project().completed.len(), 1);
    }

    #[test]
    fn read_only_board_rejects_and_hides_controls() {
        let mut b = board(false);
        for id in ["a", "b", "c"] {
            assert!(b.controls_for(id).is_empty());
        }
        assert_eq!(
            b.begin_transition("a", TaskStatus::Done),
            Err(TransitionError::ReadOnly("2026-02-19".into()))
        );
    }

    #[test]
    fn editable_board_exposes_controls() {
        let b = board(true);
        assert_eq!(b.controls_for("a"), &[Action::Complete, Action::Cancel]);
        assert_eq!(b.controls_for("b"), &[Action::Revert, Action::Cancel]);
        assert_eq!(b.controls_for("c"), &[Action::Complete]);
        assert!(b.controls_for("missing").is_empty());
    }

    #[test]
    fn second_request_while_in_flight_is_rejected() {
        let mut b = board(true);
        let _p = started(b.begin_transition("a", TaskStatus::Done).unwrap());
        assert_eq!(
            b.begin_transition("a", TaskStatus::Cancelled),
            Err(TransitionError::InFlight("a".into()))
        );
        assert!(b.controls_for("a").is_empty());
    }

    #[test]
    fn unknown_task() {
        let mut b = board(true);
        assert_eq!(
            b.begin_transition("zzz", TaskStatus::Done),
            Err(TransitionError::UnknownTask("zzz".into()))
        );
    }

    #[test]
    fn failure_restores_previous_status() {
        let mut b = board(true);
        let p = started(b.begin_transition("a", TaskStatus::Cancelled).unwrap());
        assert!(b.fail_transition(&p));
        b.release(&p);

        assert_eq!(b.get("a").unwrap().status, TaskStatus::Planned);
        assert!(!b.is_processing("a"));
        assert_eq!(b.error(), Some(TRANSITION_FAILED));
    }

    #[test]
    fn settle_after_reload_leaves_new_set_alone() {
        let mut b = board(true);
        let p = started(b.begin_transition("a", TaskStatus::Done).unwrap());

        b.replace("2026-02-19", vec![Task::new("a", "Shah Clinic")], true);
        let _q = started(b.begin_transition("a", TaskStatus::Cancelled).unwrap());

        assert!(!b.fail_transition(&p));
        b.release(&p);
        assert_eq!(b.get("a").unwrap().status, TaskStatus::Cancelled);
        assert!(b.is_processing("a"));
    }

    #[test]
    fn failure_after_reload_does_not_flag_new_board() {
        let mut b = board(true);
        let p = started(b.begin_transition("a", TaskStatus::Done).unwrap());

        b.replace("2026-02-20", vec![Task::new("a", "Shah Clinic")], false);
        assert!(!b.fail_transition(&p));
        b.release(&p);

        assert_eq!(b.date(), Some("2026-02-20"));
        assert_eq!(b.error(), None);
        assert_eq!(b.get("a").unwrap().status, TaskStatus::Planned);
    }

    #[test]
    fn abandon_restores_without_error() {
        let mut b = board(true);
        let p = started(b.begin_transition("b", TaskStatus::Planned).unwrap());
        assert!(b.abandon(&p));
        b.release(&p);

        assert_eq!(b.get("b").unwrap().status, TaskStatus::Done);
        assert!(!b.is_processing("b"));
        assert_eq!(b.error(), None);
    }

    #[test]
    fn replace_dedupes_and_resets_state() {
        let mut b = board(true);
        b.set_error("boom");
        let gen_before = b.generation();
        b.replace(
            "2026-02-20",
            vec![Task::new("x", "1"), Task::new("x", "2")],
            false,
        );
        assert_eq!(b.len(), 1);
        assert_eq!(b.get("x").unwrap().customer_name, "1");
        assert_eq!(b.error(), None);
        assert_eq!(b.date(), Some("2026-02-20"));
        assert!(b.generation() > gen_before);
    }
}
