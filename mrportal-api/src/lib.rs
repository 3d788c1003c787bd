//! mrportal-api: async client for the MR Portal backend, plus the schedule fetcher,
//! optimistic update coordinator, and dashboard session built on it.

pub mod backend;
pub mod coordinator;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod http;

pub use backend::{Ack, LoginResponse, PortalBackend};
pub use coordinator::{Coordinator, TransitionOutcome};
pub use dashboard::{Dashboard, RefreshOutcome};
pub use error::ApiError;
pub use fetcher::ScheduleFetcher;
pub use http::HttpBackend;
