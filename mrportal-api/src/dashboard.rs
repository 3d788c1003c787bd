//! Dashboard: the session, subject selection, viewed date, and loaded board for one
//! console user, with the load and teardown lifecycle around them.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use mrportal_core::time::{is_today, shift_days};
use mrportal_core::{
    resolve_subject, Action, MrSummary, Roster, Session, SubjectResolution, TaskBoard, TaskStatus,
    TransitionError,
};

use crate::backend::PortalBackend;
use crate::coordinator::{lock, Coordinator, TransitionOutcome};
use crate::error::ApiError;
use crate::fetcher::ScheduleFetcher;

pub const SCHEDULE_LOAD_FAILED: &str = "Failed to load schedule";
pub const ROSTER_LOAD_FAILED: &str = "Failed to load MR list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Loaded { subject: String, count: usize },
    /// Privileged caller without a subject yet; nothing was requested.
    Waiting,
}

pub struct Dashboard<B: ?Sized> {
    backend: Arc<B>,
    session: Option<Session>,
    roster: Roster,
    selected: Option<String>,
    date: String,
    tz: Option<Tz>,
    board: Arc<Mutex<TaskBoard>>,
}

impl<B: PortalBackend + ?Sized> Dashboard<B> {
    pub fn new(backend: Arc<B>, session: Option<Session>, date: impl Into<String>, tz: Option<Tz>) -> Self {
        Self {
            backend,
            session,
            roster: Roster::NotRequested,
            selected: None,
            date: date.into(),
            tz,
            board: Arc::new(Mutex::new(TaskBoard::new())),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn board(&self) -> Arc<Mutex<TaskBoard>> {
        Arc::clone(&self.board)
    }

    /// Run `f` against the current board.
    pub fn with_board<R>(&self, f: impl FnOnce(&TaskBoard) -> R) -> R {
        let board = lock(&self.board);
        f(&*board)
    }

    pub fn error(&self) -> Option<String> {
        self.with_board(|b| b.error().map(str::to_string))
    }

    pub fn coordinator(&self) -> Coordinator<B> {
        Coordinator::new(Arc::clone(&self.backend), Arc::clone(&self.board))
    }

    pub fn subject(&self) -> SubjectResolution {
        resolve_subject(self.session.as_ref(), self.selected.as_deref(), &self.roster)
    }

    /// Admin picks an MR; `None` goes back to the roster default.
    pub fn select_subject(&mut self, mr_id: Option<String>) {
        self.selected = mr_id.filter(|s| !s.trim().is_empty());
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    pub fn previous_day(&mut self) -> Result<(), ApiError> {
        self.date = shift_days(&self.date, -1)?;
        Ok(())
    }

    pub fn next_day(&mut self) -> Result<(), ApiError> {
        self.date = shift_days(&self.date, 1)?;
        Ok(())
    }

    /// Mark the roster as requested. Returns false when the caller has no use for it.
    pub fn begin_roster_load(&mut self) -> bool {
        if !self.session.as_ref().is_some_and(Session::is_privileged) {
            return false;
        }
        self.roster = Roster::Pending;
        true
    }

    pub fn finish_roster_load(&mut self, result: Result<Vec<MrSummary>, ApiError>) {
        match result {
            Ok(list) => {
                info!(count = list.len(), "roster loaded");
                self.roster = Roster::Loaded(list);
            }
            Err(err) => {
                warn!(%err, "roster load failed");
                lock(&self.board).set_error(ROSTER_LOAD_FAILED);
                self.roster = Roster::Failed(err.to_string());
            }
        }
    }

    /// Fetch the MR list for the subject picker (privileged callers only).
    pub async fn load_roster(&mut self) {
        if !self.begin_roster_load() {
            return;
        }
        let result = self.backend.list_mrs().await;
        self.finish_roster_load(result);
    }

    /// Reload the board for the current (subject, date). Replaces the whole task set.
    pub async fn refresh(&mut self, now: DateTime<Utc>) -> Result<RefreshOutcome, ApiError> {
        let resolution = self.subject();
        let fetcher = ScheduleFetcher::new(Arc::clone(&self.backend));

        match fetcher.load_resolved(&resolution, &self.date).await {
            Ok(None) => Ok(RefreshOutcome::Waiting),
            Ok(Some((subject, tasks))) => {
                let editable = is_today(&self.date, self.tz, now);
                let count = tasks.len();
                lock(&self.board).replace(self.date.clone(), tasks, editable);
                Ok(RefreshOutcome::Loaded { subject, count })
            }
            Err(err) => {
                lock(&self.board).set_error(err.user_message(SCHEDULE_LOAD_FAILED));
                Err(err)
            }
        }
    }

    /// Actions to render for a task card; empty unless the board is today's.
    pub fn controls_for(&self, activity_id: &str) -> Vec<Action> {
        self.with_board(|b| b.controls_for(activity_id).to_vec())
    }

    pub async fn request_transition(
        &self,
        activity_id: &str,
        target: TaskStatus,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.coordinator().request_transition(activity_id, target).await
    }

    /// Teardown: forget the session and everything derived from it.
    pub fn logout(&mut self) {
        self.session = None;
        self.roster = Roster::NotRequested;
        self.selected = None;
        lock(&self.board).clear();
    }
}
