//! The REST surface the console consumes, as a trait so the dashboard and
//! coordinator can run against a fake in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mrportal_core::{MrSummary, ReportQuery, ReportTable, Task, TaskStatus};

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate<'a> {
    pub activity_id: &'a str,
    pub status: TaskStatus,
}

/// Generic `{"message": "..."}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// `GET /schedule/daily/{mr_id}/{date}`
    async fn daily_schedule(&self, mr_id: &str, date: &str) -> Result<Vec<Task>, ApiError>;

    /// `PUT /schedule/status`
    async fn update_status(&self, activity_id: &str, status: TaskStatus) -> Result<Ack, ApiError>;

    /// `GET /admin/mrs`
    async fn list_mrs(&self) -> Result<Vec<MrSummary>, ApiError>;

    /// `GET /reports/{kind}`
    async fn report(&self, query: &ReportQuery) -> Result<ReportTable, ApiError>;

    /// `POST /admin/generate-schedule`. Overwrites the master schedule server-side.
    async fn generate_schedule(&self) -> Result<Ack, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_update_body_uses_canonical_names() {
        let body = serde_json::to_value(StatusUpdate {
            activity_id: "A-1",
            status: TaskStatus::Planned,
        })
        .unwrap();
        assert_eq!(body, json!({"activity_id": "A-1", "status": "Planned"}));
    }

    #[test]
    fn login_response_tolerates_missing_profile() {
        let r: LoginResponse = serde_json::from_value(json!({"token": "t"})).unwrap();
        assert_eq!(r.role, None);
        assert_eq!(r.name, None);
    }
}
