use thiserror::Error;

use mrportal_core::time::DateError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `detail` is the backend's `{"detail": ...}` message when it
    /// sent one, otherwise the caller's fallback text.
    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid base URL: {0}")]
    BaseUrl(String),

    /// No subject to query. Raised before anything is sent.
    #[error("User ID missing. Please log in again.")]
    MissingSubject,

    #[error(transparent)]
    Date(#[from] DateError),
}

impl ApiError {
    /// Message for the page-level error banner.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            ApiError::MissingSubject => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}
