//! Map layer: numbered stops and the day's route line.
//!
//! Tasks without both coordinates are left off the map only; they still appear in
//! every list view.

use serde::Serialize;
use serde_json::{json, Value};

use crate::status::TaskStatus;
use crate::task::Task;

/// Ahmedabad, used when no task is plottable.
pub const DEFAULT_CENTER: (f64, f64) = (23.0225, 72.5714);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    /// 1-based visiting order among plottable tasks.
    pub number: usize,
    pub activity_id: String,
    pub customer_name: String,
    pub status: TaskStatus,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMap {
    pub stops: Vec<Stop>,
    pub center: (f64, f64),
}

pub fn marker_color(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Planned => "#f59e0b",
        TaskStatus::Done => "#10b981",
        TaskStatus::Cancelled => "#ef4444",
    }
}

impl RouteMap {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let stops: Vec<Stop> = tasks
            .iter()
            .filter_map(|t| t.coordinates().map(|c| (t, c)))
            .enumerate()
            .map(|(i, (t, (lat, lon)))| Stop {
                number: i + 1,
                activity_id: t.activity_id.clone(),
                customer_name: t.customer_name.clone(),
                status: t.status,
                latitude: lat,
                longitude: lon,
            })
            .collect();

        let center = stops
            .first()
            .map(|s| (s.latitude, s.longitude))
            .unwrap_or(DEFAULT_CENTER);

        Self { stops, center }
    }

    /// Route through the stops in order; only drawn with at least two points.
    pub fn polyline(&self) -> Option<Vec<(f64, f64)>> {
        (self.stops.len() > 1).then(|| self.stops.iter().map(|s| (s.latitude, s.longitude)).collect())
    }

    /// GeoJSON FeatureCollection: one Point per stop plus the route LineString.
    /// Coordinates are `[lon, lat]` as GeoJSON requires.
    pub fn to_geojson(&self) -> Value {
        let mut features: Vec<Value> = self
            .stops
            .iter()
            .map(|s| {
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [s.longitude, s.latitude]},
                    "properties": {
                        "number": s.number,
                        "activity_id": s.activity_id,
                        "customer_name": s.customer_name,
                        "status": s.status.as_str(),
                        "marker-color": marker_color(s.status),
                    }
                })
            })
            .collect();

        if let Some(line) = self.polyline() {
            let coords: Vec<[f64; 2]> = line.into_iter().map(|(lat, lon)| [lon, lat]).collect();
            features.push(json!({
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": coords},
                "properties": {"kind": "route"}
            }));
        }

        json!({"type": "FeatureCollection", "features": features})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_only_plottable_tasks() {
        let tasks = vec![
            Task::new("a", "A").with_coordinates(23.03, 72.56),
            Task::new("b", "B"),
            Task::new("c", "C").with_coordinates(23.05, 72.60).with_status(TaskStatus::Done),
        ];
        let m = RouteMap::from_tasks(&tasks);
        let got: Vec<_> = m.stops.iter().map(|s| (s.number, s.activity_id.as_str())).collect();
        assert_eq!(got, [(1, "a"), (2, "c")]);
        assert_eq!(m.center, (23.03, 72.56));
        assert_eq!(m.polyline().unwrap().len(), 2);
    }

    #[test]
    fn single_stop_has_no_route() {
        let m = RouteMap::from_tasks(&[Task::new("a", "A").with_coordinates(1.0, 2.0)]);
        assert!(m.polyline().is_none());
        assert_eq!(m.to_geojson()["features"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_map_uses_default_center() {
        let m = RouteMap::from_tasks(&[Task::new("a", "A")]);
        assert!(m.stops.is_empty());
        assert_eq!(m.center, DEFAULT_CENTER);
    }

    #[test]
    fn geojson_uses_lon_lat_order() {
        let m = RouteMap::from_tasks(&[
            Task::new("a", "A").with_coordinates(23.0, 72.0),
            Task::new("b", "B").with_coordinates(24.0, 73.0),
        ]);
        let g = m.to_geojson();
        assert_eq!(g["features"][0]["geometry"]["coordinates"][0], 72.0);
        assert_eq!(g["features"][2]["geometry"]["type"], "LineString");
        assert_eq!(g["features"][1]["properties"]["marker-color"], "#f59e0b");
    }
}
