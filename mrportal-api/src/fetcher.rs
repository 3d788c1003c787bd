//! Schedule fetcher: one (subject, date) in, the full ordered task set out.

use std::sync::Arc;
use tracing::info;

use mrportal_core::task::dedupe_by_id;
use mrportal_core::time::{format_date, parse_date};
use mrportal_core::{SubjectResolution, Task};

use crate::backend::PortalBackend;
use crate::error::ApiError;

pub struct ScheduleFetcher<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for ScheduleFetcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: PortalBackend + ?Sized> ScheduleFetcher<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fetch `subject`'s activities for `date` (`YYYY-MM-DD`), deduplicated by
    /// `activity_id`, in backend order.
    pub async fn load(&self, subject: &str, date: &str) -> Result<Vec<Task>, ApiError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ApiError::MissingSubject);
        }
        let date = format_date(parse_date(date)?);

        let tasks = dedupe_by_id(self.backend.daily_schedule(subject, &date).await?);
        info!(subject, date = %date, count = tasks.len(), "schedule loaded");
        Ok(tasks)
    }

    /// Like [`load`](Self::load), driven by a subject resolution.
    /// `Ok(None)` means there is nothing to fetch yet.
    pub async fn load_resolved(
        &self,
        resolution: &SubjectResolution,
        date: &str,
    ) -> Result<Option<(String, Vec<Task>)>, ApiError> {
        match resolution {
            SubjectResolution::Missing => Err(ApiError::MissingSubject),
            SubjectResolution::Waiting => Ok(None),
            SubjectResolution::Ready(subject) => {
                let tasks = self.load(subject, date).await?;
                Ok(Some((subject.clone(), tasks)))
            }
        }
    }
}
