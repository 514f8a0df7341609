use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::{Client, Task};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(flatten)]
    pub point: Coordinate,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            point: Coordinate::new(lat, lng),
            timestamp,
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CollectorStatus {
    Active,
    Traveling,
    Offline,
    Idle,
    #[serde(other)]
    Unknown,
}

impl CollectorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorStatus::Active => "active",
            CollectorStatus::Traveling => "traveling",
            CollectorStatus::Offline => "offline",
            CollectorStatus::Idle => "idle",
            CollectorStatus::Unknown => "unknown",
        }
    }

    /// Counted as "online" in summary statistics.
    pub fn is_online(&self) -> bool {
        matches!(self, CollectorStatus::Active | CollectorStatus::Traveling)
    }

    /// Never fails: unrecognised values map to [`CollectorStatus::Unknown`].
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => CollectorStatus::Active,
            "traveling" | "travelling" => CollectorStatus::Traveling,
            "offline" => CollectorStatus::Offline,
            "idle" => CollectorStatus::Idle,
            _ => CollectorStatus::Unknown,
        }
    }
}

impl fmt::Display for CollectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match CollectorStatus::parse_lenient(s) {
            CollectorStatus::Unknown => Err(format!(
                "unknown status: {s}, expected active/traveling/offline/idle"
            )),
            status => Ok(status),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationHistoryEntry {
    pub location: Location,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_visited: Option<Client>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collector {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub status: CollectorStatus,
    pub current_location: Location,
    #[serde(default)]
    pub location_history: Vec<LocationHistoryEntry>,
    #[serde(default)]
    pub current_task: Option<Task>,
    #[serde(default)]
    pub total_collected: f64,
    #[serde(default)]
    pub tasks_completed: u32,
    pub financial_year: String,
}

impl Collector {
    /// Case-insensitive match on name or current address; an empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&query)
            || self
                .current_location
                .address
                .as_deref()
                .is_some_and(|address| address.to_lowercase().contains(&query))
    }
}

/// Search box plus status chip, as applied to the sidebar and the map alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterFilter {
    pub query: String,
    pub status: Option<CollectorStatus>,
}

impl RosterFilter {
    /// `status` of `None`, `""` or `"all"` disables the status filter.
    pub fn new(query: Option<&str>, status: Option<&str>) -> Self {
        let status = status
            .map(str::trim)
            .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
            .map(CollectorStatus::parse_lenient);

        Self {
            query: query.unwrap_or_default().trim().to_string(),
            status,
        }
    }

    pub fn matches(&self, collector: &Collector) -> bool {
        self.status.is_none_or(|status| collector.status == status)
            && collector.matches_query(&self.query)
    }
}
