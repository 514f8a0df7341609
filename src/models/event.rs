use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::collector::{CollectorStatus, Location};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationUpdate {
    pub collector_id: Uuid,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectorStatus>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RosterEventKind {
    Registered,
    Moved,
    StatusChanged,
    TaskChanged,
}

/// Fan-out notification that the roster changed; map sessions re-render on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterEvent {
    pub collector_id: Uuid,
    pub kind: RosterEventKind,
    pub at: DateTime<Utc>,
}

impl RosterEvent {
    pub fn now(collector_id: Uuid, kind: RosterEventKind) -> Self {
        Self {
            collector_id,
            kind,
            at: Utc::now(),
        }
    }
}
