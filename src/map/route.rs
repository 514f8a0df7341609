use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::geo::{path_length_km, GeoBounds};
use crate::map::markers::{waypoint_role, WaypointRole};
use crate::models::collector::{Collector, Coordinate, Location, LocationHistoryEntry};
use crate::models::task::Client;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub index: usize,
    pub role: WaypointRole,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_visited: Option<Client>,
}

impl Waypoint {
    pub fn position(&self) -> Coordinate {
        self.location.point
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub dwell_minutes: u32,
    pub client_visits: usize,
    pub stops: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub collector_id: Uuid,
    pub points: Vec<Coordinate>,
    /// One per point; the last is always the current-location terminal.
    pub waypoints: Vec<Waypoint>,
    /// History entries dropped for invalid coordinates.
    pub skipped_points: usize,
}

impl Route {
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.points)
    }

    pub fn summary(&self) -> RouteSummary {
        let history = &self.waypoints[..self.waypoints.len().saturating_sub(1)];

        RouteSummary {
            distance_km: path_length_km(&self.points),
            dwell_minutes: history
                .iter()
                .filter_map(|waypoint| waypoint.duration_minutes)
                .sum(),
            client_visits: history
                .iter()
                .filter(|waypoint| waypoint.client_visited.is_some())
                .count(),
            stops: history.len(),
        }
    }

    pub fn start(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn current(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }
}

pub fn reconstruct(collector: &Collector) -> Option<Route> {
    reconstruct_route(
        collector.id,
        &collector.location_history,
        &collector.current_location,
    )
}

/// Rebuilds the travelled path from chronological history plus the live fix.
///
/// Returns `None` when there is nothing to draw: no usable history, or no
/// usable current location. Revisited places are kept as repeated waypoints.
pub fn reconstruct_route(
    collector_id: Uuid,
    history: &[LocationHistoryEntry],
    current: &Location,
) -> Option<Route> {
    if !current.point.is_valid() {
        if !history.is_empty() {
            warn!(collector_id = %collector_id, "current location invalid; route suppressed");
        }
        return None;
    }

    let usable: Vec<&LocationHistoryEntry> = history
        .iter()
        .filter(|entry| {
            let valid = entry.location.point.is_valid();
            if !valid {
                warn!(
                    collector_id = %collector_id,
                    lat = entry.location.point.lat,
                    lng = entry.location.point.lng,
                    "skipping history entry with invalid coordinate"
                );
            }
            valid
        })
        .collect();

    if usable.is_empty() {
        return None;
    }
    let skipped_points = history.len() - usable.len();

    let mut points = Vec::with_capacity(usable.len() + 1);
    let mut waypoints = Vec::with_capacity(usable.len() + 1);

    for (index, entry) in usable.into_iter().enumerate() {
        points.push(entry.location.point);
        waypoints.push(Waypoint {
            index,
            role: waypoint_role(index == 0, entry.client_visited.is_some()),
            location: entry.location.clone(),
            duration_minutes: Some(entry.duration_minutes),
            client_visited: entry.client_visited.clone(),
        });
    }

    points.push(current.point);
    waypoints.push(Waypoint {
        index: waypoints.len(),
        role: WaypointRole::Current,
        location: current.clone(),
        duration_minutes: None,
        client_visited: None,
    });

    Some(Route {
        collector_id,
        points,
        waypoints,
        skipped_points,
    })
}
