//! Schedule activity model: one customer visit for one MR on one day.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::status::TaskStatus;
use crate::wire;

/// One scheduled activity as returned by `GET /schedule/daily/{mr}/{date}`.
///
/// Only `activity_id` is required on the wire. Everything else tolerates blanks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "wire::text")]
    pub activity_id: String,

    #[serde(default, deserialize_with = "wire::status")]
    pub status: TaskStatus,

    #[serde(default, deserialize_with = "wire::text")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub locality: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub contact_person: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub start_time: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub end_time: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub activity_type: String,
    #[serde(default, deserialize_with = "wire::text")]
    pub suggested_talking_points: String,

    #[serde(default, deserialize_with = "wire::opt_text")]
    pub mr_id: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "wire::opt_text")]
    pub segment: Option<String>,

    #[serde(default, deserialize_with = "wire::number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "wire::number")]
    pub longitude: Option<f64>,

    /// Km from the previous stop, computed upstream.
    #[serde(default, deserialize_with = "wire::number")]
    pub distance_km: Option<f64>,
    #[serde(default, deserialize_with = "wire::number")]
    pub travel_duration_min: Option<f64>,
}

impl Task {
    pub fn new(activity_id: impl Into<String>, customer_name: impl Into<String>) -> Self {
        Self {
            activity_id: activity_id.into(),
            status: TaskStatus::Planned,
            customer_name: customer_name.into(),
            locality: String::new(),
            contact_person: String::new(),
            phone: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            activity_type: String::new(),
            suggested_talking_points: String::new(),
            mr_id: None,
            date: None,
            customer_id: None,
            segment: None,
            latitude: None,
            longitude: None,
            distance_km: None,
            travel_duration_min: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = locality.into();
        self
    }

    pub fn with_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = start.into();
        self.end_time = end.into();
        self
    }

    /// `(lat, lon)` when both coordinates are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    /// The backend fills unknown phones with `N/A`.
    pub fn phone(&self) -> Option<&str> {
        let p = self.phone.trim();
        (!p.is_empty() && p != "N/A").then_some(p)
    }

    pub fn time_window(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// Drop repeated `activity_id`s, keeping the first occurrence and the fetch order.
pub fn dedupe_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let mut out = Vec::with_capacity(tasks.len());
    for t in tasks {
        if seen.insert(t.activity_id.clone()) {
            out.push(t);
        } else {
            warn!(activity_id = %t.activity_id, "dropping duplicate activity");
        }
    }
    out
}
