use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::collector::Location;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub company_name: String,
    pub address: String,
    pub location: Location,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub outstanding_amount: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

/// A collection assignment. `amount_collected` is not tied to
/// `amount_to_collect`: a task may complete on a partial settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub client: Client,
    pub assigned_to: Uuid,
    pub description: String,
    pub amount_to_collect: f64,
    #[serde(default)]
    pub amount_collected: f64,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub financial_year: String,
}

impl Task {
    pub fn outstanding(&self) -> f64 {
        (self.amount_to_collect - self.amount_collected).max(0.0)
    }
}
