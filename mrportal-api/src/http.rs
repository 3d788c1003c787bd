use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use mrportal_core::{MrSummary, ReportQuery, ReportTable, Task, TaskStatus};

use crate::backend::{Ack, LoginRequest, LoginResponse, PortalBackend, StatusUpdate};
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// reqwest-backed [`PortalBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim()).map_err(|e| ApiError::BaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL plus percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Decode(format!("token is not a valid header value: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, fallback: &str) -> Result<T, ApiError> {
        let resp = req.headers(self.headers()?).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: parse_detail(&txt).unwrap_or_else(|| fallback.to_string()),
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// FastAPI error bodies look like `{"detail": "..."}`. Validation errors carry a list
/// instead of a string; those get the caller's fallback text.
pub fn parse_detail(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl PortalBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        debug!(%url, username, "login");
        let body = LoginRequest { username, password };
        self.send(
            self.client.post(url).json(&body),
            "Login failed. Please check your credentials.",
        )
        .await
    }

    async fn daily_schedule(&self, mr_id: &str, date: &str) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint(&["schedule", "daily", mr_id, date])?;
        debug!(%url, "fetch schedule");
        let tasks: Option<Vec<Task>> = self.send(self.client.get(url), "Failed to load schedule").await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn update_status(&self, activity_id: &str, status: TaskStatus) -> Result<Ack, ApiError> {
        let url = self.endpoint(&["schedule", "status"])?;
        debug!(%url, activity_id, %status, "update status");
        let body = StatusUpdate { activity_id, status };
        self.send(self.client.put(url).json(&body), "Failed to update task status")
            .await
    }

    async fn list_mrs(&self) -> Result<Vec<MrSummary>, ApiError> {
        let url = self.endpoint(&["admin", "mrs"])?;
        debug!(%url, "fetch roster");
        let mrs: Option<Vec<MrSummary>> = self.send(self.client.get(url), "Failed to load MR list").await?;
        Ok(mrs.unwrap_or_default())
    }

    async fn report(&self, query: &ReportQuery) -> Result<ReportTable, ApiError> {
        let url = self.endpoint(&["reports", query.kind.slug()])?;
        debug!(%url, "fetch report");
        let body: Value = self
            .send(self.client.get(url).query(&query.query_pairs()), "Failed to load report")
            .await?;
        Ok(ReportTable::from_response(body))
    }

    async fn generate_schedule(&self) -> Result<Ack, ApiError> {
        let url = self.endpoint(&["admin", "generate-schedule"])?;
        debug!(%url, "trigger schedule generation");
        self.send(self.client.post(url), "Failed to generate schedule")
            .await
    }
}
