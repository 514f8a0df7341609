use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::models::collector::{Collector, RosterFilter};
use crate::models::event::{LocationUpdate, RosterEvent};
use crate::models::financial_year::{default_financial_years, FinancialYear};
use crate::models::task::Task;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub config: Config,
    pub collectors: DashMap<Uuid, Collector>,
    pub tasks: DashMap<Uuid, Task>,
    pub financial_years: Vec<FinancialYear>,
    pub update_tx: mpsc::Sender<LocationUpdate>,
    pub roster_events_tx: broadcast::Sender<RosterEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config) -> (Self, mpsc::Receiver<LocationUpdate>) {
        let (update_tx, update_rx) = mpsc::channel(config.update_queue_size);
        let (roster_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        (
            Self {
                config,
                collectors: DashMap::new(),
                tasks: DashMap::new(),
                financial_years: default_financial_years(),
                update_tx,
                roster_events_tx,
                metrics: Metrics::new(),
            },
            update_rx,
        )
    }

    /// Cloned out so no shard lock is held while rendering.
    /// Sorted by name, then id, so every render sees the same order.
    pub fn roster_snapshot(&self, filter: &RosterFilter) -> Vec<Collector> {
        let mut roster: Vec<Collector> = self
            .collectors
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        roster.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        roster
    }

    pub fn publish(&self, event: RosterEvent) {
        // No subscribers simply means no map is mounted.
        let _ = self.roster_events_tx.send(event);
    }
}
