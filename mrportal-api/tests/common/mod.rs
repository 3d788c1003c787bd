#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;

use mrportal_api::{Ack, ApiError, LoginResponse, PortalBackend};
use mrportal_core::{MrSummary, ReportQuery, ReportTable, Session, Task, TaskStatus};

/// 09:00 in Ahmedabad on 2026-02-19.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 3, 30, 0).unwrap()
}

pub const TODAY: &str = "2026-02-19";

pub fn tz() -> Option<chrono_tz::Tz> {
    Some(chrono_tz::Asia::Kolkata)
}

pub fn token(user_id: &str, role: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = serde_json::json!({
        "user_id": user_id,
        "role": role,
        "name": user_id,
        "exp": now().timestamp() + 86_400,
    });
    format!("{header}.{}.sig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

pub fn session(user_id: &str, role: &str) -> Session {
    Session::from_token(&token(user_id, role), now()).unwrap()
}

/// In-memory backend with scripted responses.
#[derive(Default)]
pub struct FakeBackend {
    schedules: Mutex<HashMap<(String, String), Vec<Task>>>,
    schedule_calls: Mutex<Vec<(String, String)>>,
    schedule_fails: Mutex<bool>,
    status_calls: Mutex<Vec<(String, TaskStatus)>>,
    failing_ids: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<bool>>>,
    roster: Mutex<Option<Vec<MrSummary>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(self, mr_id: &str, date: &str, tasks: Vec<Task>) -> Self {
        self.schedules
            .lock()
            .unwrap()
            .insert((mr_id.to_string(), date.to_string()), tasks);
        self
    }

    pub fn with_roster(self, roster: Vec<MrSummary>) -> Self {
        *self.roster.lock().unwrap() = Some(roster);
        self
    }

    pub fn fail_schedule_loads(&self) {
        *self.schedule_fails.lock().unwrap() = true;
    }

    /// Status updates for `activity_id` will be rejected.
    pub fn fail_updates_for(&self, activity_id: &str) {
        self.failing_ids.lock().unwrap().push(activity_id.to_string());
    }

    /// Hold the next status update for `activity_id` until the sender fires;
    /// `true` succeeds, `false` fails.
    pub fn gate(&self, activity_id: &str) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(activity_id.to_string(), rx);
        tx
    }

    pub fn schedule_calls(&self) -> Vec<(String, String)> {
        self.schedule_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<(String, TaskStatus)> {
        self.status_calls.lock().unwrap().clone()
    }
}

fn rejected(detail: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        detail: detail.to_string(),
    }
}

#[async_trait]
impl PortalBackend for FakeBackend {
    async fn login(&self, username: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        Ok(LoginResponse {
            token: token(username, "mr"),
            role: Some("mr".into()),
            name: None,
        })
    }

    async fn daily_schedule(&self, mr_id: &str, date: &str) -> Result<Vec<Task>, ApiError> {
        self.schedule_calls
            .lock()
            .unwrap()
            .push((mr_id.to_string(), date.to_string()));
        if *self.schedule_fails.lock().unwrap() {
            return Err(rejected("Server error: database unavailable"));
        }
        Ok(self
            .schedules
            .lock()
            .unwrap()
            .get(&(mr_id.to_string(), date.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn update_status(&self, activity_id: &str, status: TaskStatus) -> Result<Ack, ApiError> {
        self.status_calls
            .lock()
            .unwrap()
            .push((activity_id.to_string(), status));

        let gate = self.gates.lock().unwrap().remove(activity_id);
        let mut ok = !self.failing_ids.lock().unwrap().iter().any(|id| id == activity_id);
        if let Some(rx) = gate {
            ok = ok && rx.await.unwrap_or(false);
        }

        if ok {
            Ok(Ack {
                message: Some(format!("Task {activity_id} updated to {status}")),
            })
        } else {
            Err(rejected(&format!("Activity ID '{activity_id}' not found or update failed")))
        }
    }

    async fn list_mrs(&self) -> Result<Vec<MrSummary>, ApiError> {
        self.roster
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| rejected("Failed to load MR list"))
    }

    async fn report(&self, _query: &ReportQuery) -> Result<ReportTable, ApiError> {
        Ok(ReportTable::default())
    }

    async fn generate_schedule(&self) -> Result<Ack, ApiError> {
        Ok(Ack {
            message: Some("Schedule generated for 0 MRs!".into()),
        })
    }
}
