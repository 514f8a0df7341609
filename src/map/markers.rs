//! Visual descriptors for every marker and route line the map draws.
//!
//! Everything here is a pure function of its inputs: the same status or
//! waypoint role always yields an identical descriptor.

use serde::Serialize;

use crate::models::collector::CollectorStatus;

pub const ACTIVE_COLOR: &str = "#22c55e";
pub const TRAVELING_COLOR: &str = "#f59e0b";
pub const OFFLINE_COLOR: &str = "#ef4444";
pub const IDLE_COLOR: &str = "#6b7280";
pub const CLIENT_COLOR: &str = "#06b6d4";

pub const START_COLOR: &str = "#22c55e";
pub const STOP_COLOR: &str = "#3b82f6";
pub const CLIENT_VISIT_COLOR: &str = "#a855f7";
pub const CURRENT_COLOR: &str = "#f97316";

const ROUTE_COLOR: &str = "#06b6d4";
const ROUTE_SHADOW_COLOR: &str = "#0e7490";
const ROUTE_DIRECTION_COLOR: &str = "#ffffff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Circle,
    RoundedSquare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Person,
    Building,
    Flag,
    Pin,
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointRole {
    Start,
    Stop,
    ClientVisit,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub shape: MarkerShape,
    pub glyph: Glyph,
    pub color: &'static str,
    pub size: [u32; 2],
    pub anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub pulse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

pub fn status_color(status: CollectorStatus) -> &'static str {
    match status {
        CollectorStatus::Active => ACTIVE_COLOR,
        CollectorStatus::Traveling => TRAVELING_COLOR,
        CollectorStatus::Offline => OFFLINE_COLOR,
        CollectorStatus::Idle | CollectorStatus::Unknown => IDLE_COLOR,
    }
}

/// Round pin colored by status; only active collectors pulse.
pub fn collector_icon(status: CollectorStatus) -> MarkerIcon {
    MarkerIcon {
        shape: MarkerShape::Circle,
        glyph: Glyph::Person,
        color: status_color(status),
        size: [40, 40],
        anchor: [20, 40],
        popup_anchor: [0, -40],
        pulse: status == CollectorStatus::Active,
        label: None,
    }
}

pub fn client_icon() -> MarkerIcon {
    MarkerIcon {
        shape: MarkerShape::RoundedSquare,
        glyph: Glyph::Building,
        color: CLIENT_COLOR,
        size: [32, 32],
        anchor: [16, 32],
        popup_anchor: [0, -32],
        pulse: false,
        label: None,
    }
}

/// Start wins over client visit, which wins over a plain stop.
pub fn waypoint_role(is_start: bool, has_client_visit: bool) -> WaypointRole {
    if is_start {
        WaypointRole::Start
    } else if has_client_visit {
        WaypointRole::ClientVisit
    } else {
        WaypointRole::Stop
    }
}

pub fn waypoint_color(role: WaypointRole) -> &'static str {
    match role {
        WaypointRole::Start => START_COLOR,
        WaypointRole::Stop => STOP_COLOR,
        WaypointRole::ClientVisit => CLIENT_VISIT_COLOR,
        WaypointRole::Current => CURRENT_COLOR,
    }
}

pub fn waypoint_icon(index: usize, is_start: bool, has_client_visit: bool) -> MarkerIcon {
    let role = waypoint_role(is_start, has_client_visit);
    let glyph = match role {
        WaypointRole::Start => Glyph::Flag,
        WaypointRole::ClientVisit => Glyph::Building,
        WaypointRole::Stop | WaypointRole::Current => Glyph::Pin,
    };

    MarkerIcon {
        shape: MarkerShape::Circle,
        glyph,
        color: waypoint_color(role),
        size: [24, 24],
        anchor: [12, 12],
        popup_anchor: [0, -12],
        pulse: false,
        label: Some((index + 1).to_string()),
    }
}

pub fn current_location_icon() -> MarkerIcon {
    MarkerIcon {
        shape: MarkerShape::Circle,
        glyph: Glyph::Navigation,
        color: CURRENT_COLOR,
        size: [30, 30],
        anchor: [15, 15],
        popup_anchor: [0, -15],
        pulse: true,
        label: None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<&'static str>,
    pub animated: bool,
}

pub fn route_shadow_style() -> LineStyle {
    LineStyle {
        color: ROUTE_SHADOW_COLOR,
        weight: 10,
        opacity: 0.25,
        dash_array: None,
        animated: false,
    }
}

pub fn route_line_style() -> LineStyle {
    LineStyle {
        color: ROUTE_COLOR,
        weight: 4,
        opacity: 0.9,
        dash_array: None,
        animated: false,
    }
}

/// Marching dashes over the route line; cosmetic direction cue only.
pub fn route_direction_style() -> LineStyle {
    LineStyle {
        color: ROUTE_DIRECTION_COLOR,
        weight: 2,
        opacity: 0.8,
        dash_array: Some("10, 15"),
        animated: true,
    }
}
