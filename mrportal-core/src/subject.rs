//! Whose schedule is being viewed.
//!
//! An MR always sees their own day. An admin picks an MR from the roster
//! (`GET /admin/mrs`); until an MR is picked or the roster arrives there is nothing
//! to fetch, and that is not an error.

use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::wire;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrSummary {
    #[serde(deserialize_with = "wire::text")]
    pub mr_id: String,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub display_name: Option<String>,
}

impl MrSummary {
    pub fn new(mr_id: impl Into<String>, display_name: Option<&str>) -> Self {
        Self {
            mr_id: mr_id.into(),
            display_name: display_name.map(str::to_string),
        }
    }

    /// Dropdown label, e.g. `Ravi Patel (MR_W1_1)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name.as_deref().unwrap_or(&self.mr_id), self.mr_id)
    }
}

/// Load state of the admin's MR list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Roster {
    #[default]
    NotRequested,
    Pending,
    Loaded(Vec<MrSummary>),
    Failed(String),
}

impl Roster {
    pub fn entries(&self) -> &[MrSummary] {
        match self {
            Roster::Loaded(list) => list,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectResolution {
    /// Fetch this MR's schedule.
    Ready(String),
    /// Privileged caller without a usable subject yet. Issue nothing.
    Waiting,
    /// No identity to act on. A client-side error; nothing is sent.
    Missing,
}

pub fn resolve_subject(
    session: Option<&Session>,
    selected: Option<&str>,
    roster: &Roster,
) -> SubjectResolution {
    let Some(session) = session else {
        return SubjectResolution::Missing;
    };

    if !session.is_privileged() {
        let own = session.user_id().trim();
        return if own.is_empty() {
            SubjectResolution::Missing
        } else {
            SubjectResolution::Ready(own.to_string())
        };
    }

    if let Some(id) = selected.map(str::trim).filter(|s| !s.is_empty()) {
        return SubjectResolution::Ready(id.to_string());
    }

    match roster.entries().first() {
        Some(first) => SubjectResolution::Ready(first.mr_id.clone()),
        None => SubjectResolution::Waiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::make_token;
    use chrono::Utc;
    use serde_json::json;

    fn session(user_id: &str, role: &str) -> Session {
        Session::from_token(&make_token(json!({"user_id": user_id, "role": role})), Utc::now())
            .unwrap()
    }

    #[test]
    fn mr_uses_own_id_regardless_of_selection() {
        let s = session("MR_W1_1", "mr");
        assert_eq!(
            resolve_subject(Some(&s), Some("MR_OTHER"), &Roster::NotRequested),
            SubjectResolution::Ready("MR_W1_1".into())
        );
    }

    #[test]
    fn no_session_is_missing() {
        assert_eq!(resolve_subject(None, None, &Roster::Pending), SubjectResolution::Missing);
    }

    #[test]
    fn admin_waits_for_roster() {
        let s = session("ADMIN", "admin");
        assert_eq!(resolve_subject(Some(&s), None, &Roster::Pending), SubjectResolution::Waiting);
        assert_eq!(
            resolve_subject(Some(&s), None, &Roster::Loaded(vec![])),
            SubjectResolution::Waiting
        );
        assert_eq!(
            resolve_subject(Some(&s), None, &Roster::Failed("boom".into())),
            SubjectResolution::Waiting
        );
    }

    #[test]
    fn admin_defaults_to_first_roster_entry() {
        let s = session("ADMIN", "admin");
        let roster = Roster::Loaded(vec![
            MrSummary::new("MR_A", Some("Asha")),
            MrSummary::new("MR_B", None),
        ]);
        assert_eq!(
            resolve_subject(Some(&s), None, &roster),
            SubjectResolution::Ready("MR_A".into())
        );
        assert_eq!(
            resolve_subject(Some(&s), Some("MR_B"), &roster),
            SubjectResolution::Ready("MR_B".into())
        );
    }

    #[test]
    fn roster_labels() {
        assert_eq!(MrSummary::new("MR_A", Some("Asha")).label(), "Asha (MR_A)");
        assert_eq!(MrSummary::new("MR_B", None).label(), "MR_B (MR_B)");
    }

    #[test]
    fn decodes_roster_rows() {
        let rows: Vec<MrSummary> = serde_json::from_value(json!([
            {"mr_id": "MR_A", "display_name": "Asha"},
            {"mr_id": 42, "display_name": ""}
        ]))
        .unwrap();
        assert_eq!(rows[1], MrSummary::new("42", None));
    }
}
