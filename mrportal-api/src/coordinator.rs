//! Optimistic status updates.
//!
//! A request marks the task as processing, applies the new status to the board at
//! once, then confirms with the backend. On failure the previous status is put back.
//! The processing marker is owned by a guard, so it is released however the request
//! ends. A request dropped before the backend answers is rolled back like a failure,
//! minus the error message.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use mrportal_core::{Action, PendingTransition, TaskBoard, TaskStatus, Transition, TransitionError};

use crate::backend::PortalBackend;
use crate::error::ApiError;

#[derive(Debug)]
pub enum TransitionOutcome {
    /// Task already had the requested status; nothing was sent.
    NoOp,
    Committed {
        previous: TaskStatus,
        current: TaskStatus,
    },
    /// Backend refused. `rolled_back` is false only if the board was reloaded meanwhile.
    Failed { error: ApiError, rolled_back: bool },
}

impl TransitionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransitionOutcome::Committed { .. })
    }
}

pub(crate) fn lock(board: &Mutex<TaskBoard>) -> MutexGuard<'_, TaskBoard> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

struct ProcessingGuard<'a> {
    board: &'a Mutex<TaskBoard>,
    pending: &'a PendingTransition,
    settled: bool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        let mut board = lock(self.board);
        if !self.settled && board.abandon(self.pending) {
            warn!(activity_id = %self.pending.activity_id, "status update dropped before settling; rolled back");
        }
        board.release(self.pending);
    }
}

pub struct Coordinator<B: ?Sized> {
    backend: Arc<B>,
    board: Arc<Mutex<TaskBoard>>,
}

impl<B: ?Sized> Clone for Coordinator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            board: Arc::clone(&self.board),
        }
    }
}

impl<B: PortalBackend + ?Sized> Coordinator<B> {
    pub fn new(backend: Arc<B>, board: Arc<Mutex<TaskBoard>>) -> Self {
        Self { backend, board }
    }

    pub fn board(&self) -> &Arc<Mutex<TaskBoard>> {
        &self.board
    }

    /// Precondition failures (unknown task, read-only day, update already in flight)
    /// come back as `Err` and leave the board untouched. Backend failures come back as
    /// `Ok(TransitionOutcome::Failed)` after the rollback.
    pub async fn request_transition(
        &self,
        activity_id: &str,
        target: TaskStatus,
    ) -> Result<TransitionOutcome, TransitionError> {
        let pending = match lock(&self.board).begin_transition(activity_id, target)? {
            Transition::NoOp => return Ok(TransitionOutcome::NoOp),
            Transition::Started(p) => p,
        };
        let mut processing = ProcessingGuard {
            board: &self.board,
            pending: &pending,
            settled: false,
        };

        let result = self.backend.update_status(activity_id, target).await;
        processing.settled = true;
        match result {
            Ok(_) => {
                info!(activity_id, from = %pending.previous, to = %target, "status updated");
                Ok(TransitionOutcome::Committed {
                    previous: pending.previous,
                    current: target,
                })
            }
            Err(error) => {
                let rolled_back = lock(&self.board).fail_transition(&pending);
                warn!(activity_id, %error, rolled_back, "status update failed");
                Ok(TransitionOutcome::Failed { error, rolled_back })
            }
        }
    }

    /// Run a card action (Complete / Revert / Cancel).
    pub async fn apply(&self, activity_id: &str, action: Action) -> Result<TransitionOutcome, TransitionError> {
        self.request_transition(activity_id, action.target()).await
    }
}
