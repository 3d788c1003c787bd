use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use mrportal_api::PortalBackend;
use mrportal_core::time::{format_date, parse_date};
use mrportal_core::{ReportKind, ReportPeriod, ReportQuery, Session};

use crate::app::App;
use crate::auth::confirm;
use crate::render;

/// Admins see everyone unless they pass `--mr`; everybody else only themselves.
pub fn report_subject(session: &Session, mr: Option<String>) -> Option<String> {
    if session.is_privileged() {
        mr.filter(|m| !m.trim().is_empty())
    } else {
        Some(session.user_id().to_string())
    }
}

pub fn range(from: &str, to: &str) -> Result<ReportPeriod> {
    Ok(ReportPeriod::Range {
        start: format_date(parse_date(from)?),
        end: format_date(parse_date(to)?),
    })
}

pub struct ReportRequest {
    pub kind: ReportKind,
    pub period: ReportPeriod,
    pub mr: Option<String>,
    pub page: usize,
    /// `Some(None)` writes to the kind's default file name.
    pub csv: Option<Option<PathBuf>>,
}

pub async fn run(app: &App, req: ReportRequest) -> Result<()> {
    let session = app.session(Utc::now())?;
    let query = ReportQuery::new(req.kind, req.period, report_subject(&session, req.mr))?;

    let table = app.authed_backend(&session)?.report(&query).await.map_err(|e| {
        let msg = e.user_message("Failed to load report");
        anyhow::Error::new(e).context(msg)
    })?;

    let page_size = app.config.page_size();
    let pages = table.page_count(page_size).max(1);
    if req.page == 0 || req.page > pages {
        bail!("page {} out of range (1..={pages})", req.page);
    }
    print!("{}", render::report_page(req.kind, &table, req.page, page_size));

    if let Some(path) = req.csv {
        if table.is_empty() {
            println!("Nothing to export.");
            return Ok(());
        }
        let path = path.unwrap_or_else(|| PathBuf::from(req.kind.default_csv_name()));
        fs::write(&path, table.to_csv()?).with_context(|| format!("write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

pub async fn generate_schedule(app: &App, yes: bool) -> Result<()> {
    let session = app.session(Utc::now())?;
    if !session.is_privileged() {
        bail!("Only admins can generate schedules");
    }
    if !yes && !confirm("This overwrites the master schedule for every MR. Continue?")? {
        println!("Cancelled.");
        return Ok(());
    }
    let ack = app.authed_backend(&session)?.generate_schedule().await.map_err(|e| {
        let msg = e.user_message("Failed to generate schedule");
        anyhow::Error::new(e).context(msg)
    })?;
    println!("{}", ack.message.as_deref().unwrap_or("Schedule generated."));
    Ok(())
}
