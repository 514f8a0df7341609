use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::collector::{Collector, LocationHistoryEntry};
use crate::models::event::{LocationUpdate, RosterEvent, RosterEventKind};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Applied { client_visited: Option<Uuid> },
    /// Older than the collector's current fix; dropped.
    Stale,
}

pub async fn run_tracking_engine(state: Arc<AppState>, mut update_rx: mpsc::Receiver<LocationUpdate>) {
    info!("tracking engine started");

    while let Some(update) = update_rx.recv().await {
        state.metrics.updates_in_queue.dec();

        let collector_id = update.collector_id;
        let outcome = match process_update(&state, update) {
            Ok(UpdateOutcome::Applied { client_visited }) => {
                debug!(
                    collector_id = %collector_id,
                    client_visited = ?client_visited,
                    "location applied"
                );
                "applied"
            }
            Ok(UpdateOutcome::Stale) => {
                warn!(collector_id = %collector_id, "dropping stale location fix");
                "stale"
            }
            Err(err) => {
                error!(collector_id = %collector_id, error = %err, "failed to apply location update");
                "error"
            }
        };

        state
            .metrics
            .location_updates_total
            .with_label_values(&[outcome])
            .inc();
    }

    warn!("tracking engine stopped: update channel closed");
}

fn process_update(state: &AppState, update: LocationUpdate) -> Result<UpdateOutcome, AppError> {
    let outcome = {
        let mut collector = state
            .collectors
            .get_mut(&update.collector_id)
            .ok_or_else(|| AppError::NotFound(format!("collector {} not found", update.collector_id)))?;

        apply_update(
            &mut collector,
            &update,
            state.config.visit_radius_m,
            state.config.max_history_entries,
        )?
    };

    if matches!(outcome, UpdateOutcome::Applied { .. }) {
        state.publish(RosterEvent::now(update.collector_id, RosterEventKind::Moved));
    }

    Ok(outcome)
}

/// Moves `collector` to the new fix, pushing the old one onto its history.
///
/// The departed spot records how long the collector stayed there and, if it
/// lies within `visit_radius_m` of the current task's client, that client.
/// History keeps at most `max_history` entries, dropping the oldest.
pub fn apply_update(
    collector: &mut Collector,
    update: &LocationUpdate,
    visit_radius_m: f64,
    max_history: usize,
) -> Result<UpdateOutcome, AppError> {
    let next = &update.location;
    if !next.point.is_valid() {
        return Err(AppError::InvalidCoordinate {
            lat: next.point.lat,
            lng: next.point.lng,
        });
    }

    let previous = &collector.current_location;
    if next.timestamp < previous.timestamp {
        return Ok(UpdateOutcome::Stale);
    }

    let duration_minutes = (next.timestamp - previous.timestamp)
        .num_minutes()
        .clamp(0, i64::from(u32::MAX)) as u32;

    let client_visited = collector
        .current_task
        .as_ref()
        .map(|task| &task.client)
        .filter(|client| {
            client.location.point.is_valid()
                && haversine_km(&previous.point, &client.location.point) * 1_000.0
                    <= visit_radius_m
        })
        .cloned();
    let visited_id = client_visited.as_ref().map(|client| client.id);

    let departed = std::mem::replace(&mut collector.current_location, next.clone());
    collector.location_history.push(LocationHistoryEntry {
        location: departed,
        duration_minutes,
        client_visited,
    });

    let max_history = max_history.max(1);
    if collector.location_history.len() > max_history {
        let excess = collector.location_history.len() - max_history;
        collector.location_history.drain(..excess);
    }

    if let Some(status) = update.status {
        collector.status = status;
    }

    Ok(UpdateOutcome::Applied {
        client_visited: visited_id,
    })
}
