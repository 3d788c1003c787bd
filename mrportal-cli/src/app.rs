use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::debug;

use mrportal_api::HttpBackend;
use mrportal_core::Session;

use crate::config::{effective_config, Config};
use crate::state::StateDir;

/// Everything a command needs before it talks to the backend.
pub struct App {
    pub state: StateDir,
    pub config: Config,
    pub tz: Option<Tz>,
}

impl App {
    pub fn load() -> Result<Self> {
        let state = StateDir::locate()?;
        let config = effective_config(&state)?;
        let tz = config.timezone()?;
        debug!(home = %state.root().display(), base_url = %config.api.base_url, "loaded config");
        Ok(Self { state, config, tz })
    }

    pub fn backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(&self.config.api.base_url, self.config.timeout())
            .with_context(|| format!("API base URL {}", self.config.api.base_url))
    }

    pub fn session(&self, now: DateTime<Utc>) -> Result<Session> {
        match self.state.load_session(now)? {
            Some(session) => Ok(session),
            None => bail!("Not logged in. Run: mrportal login --username <id>"),
        }
    }

    /// Backend carrying the session's bearer token.
    pub fn authed_backend(&self, session: &Session) -> Result<Arc<HttpBackend>> {
        Ok(Arc::new(self.backend()?.with_token(session.token())))
    }
}
