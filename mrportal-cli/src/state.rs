use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use mrportal_core::{MrSummary, Session};

/// `$MRPORTAL_HOME`, else `$HOME/.mrportal`.
pub fn home_from(override_dir: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home.filter(|h| !h.is_empty()).context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".mrportal"))
}

/// What `login` leaves behind: the raw token plus the profile fields the login
/// endpoint returned next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn locate() -> Result<Self> {
        let root = home_from(std::env::var_os("MRPORTAL_HOME"), std::env::var_os("HOME"))?;
        Ok(Self::at(root))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<&Path> {
        fs::create_dir_all(&self.root).with_context(|| format!("create {}", self.root.display()))?;
        Ok(&self.root)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    pub fn roster_path(&self) -> PathBuf {
        self.root.join("roster.json")
    }

    pub fn save_session(&self, stored: &StoredSession) -> Result<()> {
        self.ensure()?;
        let p = self.session_path();
        let json = serde_json::to_string_pretty(stored)?;
        fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
        Ok(())
    }

    /// The saved session, if one exists and is still usable at `now`. A token that
    /// no longer decodes or has expired is deleted.
    pub fn load_session(&self, now: DateTime<Utc>) -> Result<Option<Session>> {
        let p = self.session_path();
        if !p.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        let stored: StoredSession = match serde_json::from_str(&s) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(%err, path = %p.display(), "discarding unreadable session file");
                remove_if_exists(&p)?;
                return Ok(None);
            }
        };

        match Session::from_token(&stored.token, now) {
            Ok(session) => Ok(Some(
                session.with_login_profile(stored.role.as_deref(), stored.name.as_deref()),
            )),
            Err(err) => {
                warn!(%err, "discarding saved session");
                remove_if_exists(&p)?;
                Ok(None)
            }
        }
    }

    pub fn save_roster(&self, roster: &[MrSummary]) -> Result<()> {
        self.ensure()?;
        let p = self.roster_path();
        let json = serde_json::to_string_pretty(roster)?;
        fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
        Ok(())
    }

    pub fn load_roster(&self) -> Result<Option<Vec<MrSummary>>> {
        let p = self.roster_path();
        if !p.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        Ok(Some(serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?))
    }

    /// Logout teardown: drop the session and everything cached under it.
    pub fn clear_session(&self) -> Result<()> {
        remove_if_exists(&self.session_path())?;
        remove_if_exists(&self.roster_path())
    }
}

fn remove_if_exists(p: &Path) -> Result<()> {
    match fs::remove_file(p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("remove {}", p.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use mrportal_core::Role;

    fn token(exp: i64) -> String {
        let claims = format!(r#"{{"user_id":"MR_W1_1","role":"mr","exp":{exp}}}"#);
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(claims))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, 3, 30, 0).unwrap()
    }

    #[test]
    fn home_prefers_override() {
        let p = home_from(Some("/tmp/portal".into()), Some("/home/a".into())).unwrap();
        assert_eq!(p, PathBuf::from("/tmp/portal"));
        let p = home_from(Some("".into()), Some("/home/a".into())).unwrap();
        assert_eq!(p, PathBuf::from("/home/a/.mrportal"));
        assert!(home_from(None, None).is_err());
    }

    #[test]
    fn session_round_trip_applies_login_profile() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().join("nested"));
        state
            .save_session(&StoredSession {
                token: token(now().timestamp() + 3600),
                role: Some("admin".into()),
                name: Some("Ops Desk".into()),
            })
            .unwrap();

        let session = state.load_session(now()).unwrap().unwrap();
        assert_eq!(session.user_id(), "MR_W1_1");
        assert_eq!(session.identity().role, Role::Admin);
        assert_eq!(session.identity().name, "Ops Desk");
    }

    #[test]
    fn expired_session_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path());
        state
            .save_session(&StoredSession {
                token: token(now().timestamp() - 1),
                role: None,
                name: None,
            })
            .unwrap();

        assert!(state.load_session(now()).unwrap().is_none());
        assert!(!state.session_path().exists());
    }

    #[test]
    fn garbage_session_file_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path());
        fs::write(state.session_path(), "{not json").unwrap();
        assert!(state.load_session(now()).unwrap().is_none());
        assert!(!state.session_path().exists());
    }

    #[test]
    fn clear_session_removes_roster_cache() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path());
        state
            .save_session(&StoredSession {
                token: token(now().timestamp() + 60),
                role: None,
                name: None,
            })
            .unwrap();
        state.save_roster(&[MrSummary::new("MR_A", Some("Asha"))]).unwrap();
        assert_eq!(state.load_roster().unwrap().unwrap().len(), 1);

        state.clear_session().unwrap();
        assert!(!state.session_path().exists());
        assert!(state.load_roster().unwrap().is_none());
        // Second logout is harmless.
        state.clear_session().unwrap();
    }
}
