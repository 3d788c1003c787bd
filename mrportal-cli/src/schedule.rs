use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use mrportal_api::{Dashboard, HttpBackend, PortalBackend, RefreshOutcome, TransitionOutcome};
use mrportal_core::time::{format_date, parse_date, today_string};
use mrportal_core::{Action, RouteMap, TRANSITION_FAILED};

use crate::app::App;
use crate::render;

/// A dashboard loaded for `date` (default today) and, for admins, `mr`.
/// Returns `None` when there is no subject to show.
async fn open(app: &App, date: Option<&str>, mr: Option<String>) -> Result<Option<(String, Dashboard<HttpBackend>)>> {
    let now = Utc::now();
    let session = app.session(now)?;
    let privileged = session.is_privileged();
    let backend = app.authed_backend(&session)?;

    let date = match date {
        Some(d) => format_date(parse_date(d)?),
        None => today_string(app.tz, now),
    };
    let mut dash = Dashboard::new(backend, Some(session), date, app.tz);

    if privileged {
        if mr.is_none() {
            load_roster(app, &mut dash).await?;
        }
        dash.select_subject(mr);
    } else if mr.is_some() {
        warn!("--mr is only honoured for admins; showing your own schedule");
    }

    match dash.refresh(now).await {
        Ok(RefreshOutcome::Loaded { subject, count }) => {
            info!(%subject, count, "schedule loaded");
            Ok(Some((subject, dash)))
        }
        Ok(RefreshOutcome::Waiting) => {
            println!("No MR to show. Pass --mr <ID> (see: mrportal admin mrs).");
            Ok(None)
        }
        Err(err) => {
            let msg = dash.error().unwrap_or_else(|| err.to_string());
            Err(anyhow::Error::new(err).context(msg))
        }
    }
}

/// Roster for the default subject: the cached copy from `admin mrs`, else a live fetch.
async fn load_roster(app: &App, dash: &mut Dashboard<HttpBackend>) -> Result<()> {
    if let Some(cached) = app.state.load_roster()? {
        if dash.begin_roster_load() {
            dash.finish_roster_load(Ok(cached));
        }
        return Ok(());
    }
    dash.load_roster().await;
    if let Some(err) = dash.error() {
        bail!("{err}");
    }
    app.state.save_roster(dash.roster().entries())?;
    Ok(())
}

pub async fn show(app: &App, date: Option<String>, mr: Option<String>) -> Result<()> {
    let Some((subject, dash)) = open(app, date.as_deref(), mr).await? else {
        return Ok(());
    };
    print!("{}", dash.with_board(|b| render::schedule(&subject, b)));
    Ok(())
}

pub async fn transition(app: &App, activity_id: &str, action: Action, mr: Option<String>) -> Result<()> {
    let Some((_, dash)) = open(app, None, mr).await? else {
        return Ok(());
    };

    let current = dash.with_board(|b| b.get(activity_id).map(|t| t.status));
    let Some(current) = current else {
        bail!("No activity {activity_id} on today's schedule");
    };
    if !dash.controls_for(activity_id).contains(&action) {
        bail!("Cannot {} activity {activity_id} while it is {current}", action.label());
    }

    match dash.coordinator().apply(activity_id, action).await? {
        TransitionOutcome::NoOp => println!("{activity_id} is already {current}."),
        TransitionOutcome::Committed { previous, current } => {
            println!("{activity_id}: {previous} -> {current}");
        }
        TransitionOutcome::Failed { error, rolled_back } => {
            if rolled_back {
                println!("{activity_id} restored to {current}.");
            }
            let msg = error.user_message(TRANSITION_FAILED);
            return Err(anyhow::Error::new(error).context(msg));
        }
    }
    Ok(())
}

pub async fn map(app: &App, date: Option<String>, mr: Option<String>, geojson: Option<&Path>) -> Result<()> {
    let Some((subject, dash)) = open(app, date.as_deref(), mr).await? else {
        return Ok(());
    };
    let route = dash.with_board(|b| RouteMap::from_tasks(b.tasks()));

    println!("# Route for {subject} on {}\n", dash.date());
    print!("{}", render::route(&route));

    if let Some(path) = geojson {
        let body = serde_json::to_string_pretty(&route.to_geojson())?;
        fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Used by `admin mrs`.
pub async fn list_roster(app: &App) -> Result<()> {
    let session = app.session(Utc::now())?;
    if !session.is_privileged() {
        bail!("Only admins can list MRs");
    }
    let roster = app
        .authed_backend(&session)?
        .list_mrs()
        .await
        .context(mrportal_api::dashboard::ROSTER_LOAD_FAILED)?;
    app.state.save_roster(&roster)?;
    print!("{}", render::roster(&roster));
    Ok(())
}
