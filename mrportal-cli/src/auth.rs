use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::io::{self, Write};
use tracing::info;

use mrportal_api::PortalBackend;
use mrportal_core::Session;

use crate::app::App;
use crate::state::StoredSession;

pub fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// y/N question; anything but an explicit yes declines.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{question} [y/N]"))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub async fn login(app: &App, username: &str, password: Option<String>) -> Result<()> {
    let username = username.trim();
    if username.is_empty() {
        bail!("username is required");
    }
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    let resp = app.backend()?.login(username, &password).await.map_err(|e| {
        let msg = e.user_message("Login failed");
        anyhow::Error::new(e).context(msg)
    })?;

    let session = Session::from_token(&resp.token, Utc::now())
        .context("backend returned an unusable token")?
        .with_login_profile(resp.role.as_deref(), resp.name.as_deref());

    app.state.save_session(&StoredSession {
        token: resp.token,
        role: resp.role,
        name: resp.name,
    })?;
    info!(user_id = session.user_id(), "logged in");

    let id = session.identity();
    println!("Logged in as {} ({}, {})", id.name, id.user_id, id.role);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.state.clear_session()?;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let Some(session) = app.state.load_session(Utc::now())? else {
        println!("Not logged in.");
        return Ok(());
    };
    let id = session.identity();
    println!("User:    {}", id.user_id);
    println!("Name:    {}", id.name);
    println!("Role:    {}", id.role);
    match id.expires_at {
        Some(exp) => println!("Expires: {}", exp.to_rfc3339()),
        None => println!("Expires: never"),
    }
    Ok(())
}
