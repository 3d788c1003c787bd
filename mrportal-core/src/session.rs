//! Identity token decoding and the session value passed to everything that needs
//! to know who is acting.
//!
//! The token is a JWT issued by `POST /auth/login`. The client never holds the signing
//! key, so only the payload is decoded; the backend remains the authority.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token is not a JWT (expected three dot-separated segments)")]
    Malformed,
    #[error("token payload is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("token payload is not valid claims JSON: {0}")]
    Claims(#[from] serde_json::Error),
    #[error("token carries no user id")]
    MissingUser,
    #[error("token expiry {0} is out of range")]
    InvalidExpiry(f64),
    #[error("session expired at {0}")]
    Expired(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Mr,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "mr" => Role::Mr,
            _ => Role::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Mr => f.write_str("mr"),
            Role::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    exp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub name: String,
    /// `None` when the token has no `exp` claim.
    pub expires_at: Option<DateTime<Utc>>,
}

fn claim_text(v: Option<Value>) -> Option<String> {
    match v? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `exp` seconds to a timestamp. Values chrono cannot represent are rejected rather
/// than read as "no expiry".
fn expiry(secs: f64) -> Result<DateTime<Utc>, SessionError> {
    if !secs.is_finite() {
        return Err(SessionError::InvalidExpiry(secs));
    }
    Utc.timestamp_opt(secs as i64, 0)
        .single()
        .ok_or(SessionError::InvalidExpiry(secs))
}

/// Decode the payload segment of `token` without checking expiry.
pub fn decode_identity(token: &str) -> Result<Identity, SessionError> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(SessionError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;

    let user_id = claim_text(claims.user_id)
        .or_else(|| claim_text(claims.sub))
        .ok_or(SessionError::MissingUser)?;

    let expires_at = claims.exp.map(expiry).transpose()?;

    Ok(Identity {
        role: Role::parse(claims.role.as_deref().unwrap_or_default()),
        name: claims.name.unwrap_or_else(|| user_id.clone()),
        user_id,
        expires_at,
    })
}

/// An authenticated, unexpired session. Constructed only through
/// [`Session::from_token`], so holding one means the token was usable at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    identity: Identity,
}

impl Session {
    pub fn from_token(token: &str, now: DateTime<Utc>) -> Result<Self, SessionError> {
        let identity = decode_identity(token)?;
        if let Some(exp) = identity.expires_at {
            if exp <= now {
                return Err(SessionError::Expired(exp));
            }
        }
        Ok(Self {
            token: token.trim().to_string(),
            identity,
        })
    }

    /// Apply the `role`/`name` the login endpoint returned alongside the token.
    pub fn with_login_profile(mut self, role: Option<&str>, name: Option<&str>) -> Self {
        if let Some(role) = role.filter(|r| !r.trim().is_empty()) {
            self.identity.role = Role::parse(role);
        }
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.identity.name = name.to_string();
        }
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    /// Admins may view any MR's schedule. The built-in admin account is recognised by
    /// its user id as well as its role.
    pub fn is_privileged(&self) -> bool {
        self.identity.role == Role::Admin || self.identity.user_id.eq_ignore_ascii_case("admin")
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.identity.expires_at.is_some_and(|exp| exp <= now)
    }
}
