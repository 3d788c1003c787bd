use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use mrportal_api::http::DEFAULT_BASE_URL;
use mrportal_core::report::DEFAULT_PAGE_SIZE;
use mrportal_core::time::parse_timezone;

use crate::state::StateDir;

pub const API_URL_ENV: &str = "MRPORTAL_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub display: DisplaySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// IANA zone used to decide which day is "today". Empty means the system zone.
    pub timezone: String,
    pub page_size: usize,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            timezone: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Apply an environment override for the base URL (`MRPORTAL_API_URL`).
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    pub fn timezone(&self) -> Result<Option<Tz>> {
        parse_timezone(&self.display.timezone).context("[display] timezone")
    }

    pub fn page_size(&self) -> usize {
        self.display.page_size.max(1)
    }
}

pub fn load_config(state: &StateDir) -> Result<Config> {
    let p = state.config_path();
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// Config file plus environment overrides.
pub fn effective_config(state: &StateDir) -> Result<Config> {
    Ok(load_config(state)?.with_api_url_override(std::env::var(API_URL_ENV).ok()))
}

pub fn save_config(state: &StateDir, cfg: &Config) -> Result<()> {
    state.ensure()?;
    let p = state.config_path();
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(state: &StateDir) -> Result<()> {
    let p = state.config_path();
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(state, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&StateDir::at(dir.path())).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:8000");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.page_size(), 10);
        assert_eq!(cfg.timezone().unwrap(), None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path());
        fs::write(state.config_path(), "[display]\ntimezone = \"Asia/Kolkata\"\n").unwrap();

        let cfg = load_config(&state).unwrap();
        assert_eq!(cfg.timezone().unwrap(), Some(chrono_tz::Asia::Kolkata));
        assert_eq!(cfg.display.page_size, 10);
        assert_eq!(cfg.api, ApiSection::default());
    }

    #[test]
    fn bad_timezone_is_reported() {
        let mut cfg = Config::default();
        cfg.display.timezone = "Mars/Olympus".into();
        assert!(cfg.timezone().is_err());
    }

    #[test]
    fn init_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::at(dir.path().join("home"));
        init_config(&state).unwrap();
        let mut cfg = load_config(&state).unwrap();
        assert_eq!(cfg, Config::default());

        cfg.api.timeout_secs = 5;
        save_config(&state, &cfg).unwrap();
        init_config(&state).unwrap();
        assert_eq!(load_config(&state).unwrap().api.timeout_secs, 5);
    }

    #[test]
    fn env_url_overrides_file() {
        let cfg = Config::default().with_api_url_override(Some(" http://portal:9000 ".into()));
        assert_eq!(cfg.api.base_url, "http://portal:9000");
        let cfg = Config::default().with_api_url_override(Some("  ".into()));
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
    }
}
