use crate::error::AppError;
use crate::models::event::LocationUpdate;
use crate::state::AppState;

pub async fn enqueue_update(state: &AppState, update: LocationUpdate) -> Result<(), AppError> {
    state.update_tx.send(update).await.map_err(|err| {
        tracing::error!(collector_id = %err.0.collector_id, "location queue closed");
        AppError::QueueUnavailable
    })?;

    state.metrics.updates_in_queue.inc();
    Ok(())
}
