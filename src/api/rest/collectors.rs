use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::queue::enqueue_update;
use crate::error::AppError;
use crate::map::route::{reconstruct, Route, RouteSummary};
use crate::models::collector::{
    Collector, CollectorStatus, Coordinate, Location, LocationHistoryEntry, RosterFilter,
};
use crate::models::event::{LocationUpdate, RosterEvent, RosterEventKind};
use crate::models::financial_year::FinancialYear;
use crate::models::task::Task;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/collectors", post(create_collector).get(list_collectors))
        .route("/collectors/:id", get(get_collector))
        .route("/collectors/:id/status", patch(update_collector_status))
        .route("/collectors/:id/location", post(report_location))
        .route("/collectors/:id/task", put(set_current_task))
        .route("/collectors/:id/route", get(get_route))
}

#[derive(Deserialize)]
pub struct CreateCollectorRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: Option<CollectorStatus>,
    pub current_location: Location,
    #[serde(default)]
    pub location_history: Vec<LocationHistoryEntry>,
    #[serde(default)]
    pub current_task: Option<Task>,
    #[serde(default)]
    pub total_collected: f64,
    #[serde(default)]
    pub tasks_completed: u32,
    #[serde(default)]
    pub financial_year: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: CollectorStatus,
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<CollectorStatus>,
}

#[derive(Serialize)]
pub struct LocationAccepted {
    pub collector_id: Uuid,
    pub queued: bool,
}

#[derive(Deserialize)]
pub struct SetTaskRequest {
    pub task: Option<Task>,
}

#[derive(Serialize)]
pub struct RouteResponse {
    pub route: Route,
    pub summary: RouteSummary,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("collector {} not found", id))
}

fn validate_task(task: &Task) -> Result<(), AppError> {
    if task.amount_to_collect < 0.0 || task.amount_collected < 0.0 {
        return Err(AppError::BadRequest(
            "task amounts must be >= 0".to_string(),
        ));
    }
    if !task.client.location.point.is_valid() {
        return Err(AppError::BadRequest(
            "client location is not a valid coordinate".to_string(),
        ));
    }
    Ok(())
}

async fn create_collector(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCollectorRequest>,
) -> Result<Json<Collector>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if !payload.current_location.point.is_valid() {
        return Err(AppError::BadRequest(
            "current_location is not a valid coordinate".to_string(),
        ));
    }

    if payload.total_collected < 0.0 {
        return Err(AppError::BadRequest(
            "total_collected must be >= 0".to_string(),
        ));
    }

    let id = payload.id.unwrap_or_else(Uuid::new_v4);

    let financial_year = match payload.financial_year {
        Some(fy) => fy,
        None => FinancialYear::containing(Utc::now().date_naive())
            .map(|fy| fy.id)
            .ok_or_else(|| AppError::Internal("cannot derive financial year".to_string()))?,
    };

    let current_task = match payload.current_task {
        Some(mut task) => {
            validate_task(&task)?;
            task.assigned_to = id;
            Some(task)
        }
        None => None,
    };

    let collector = Collector {
        id,
        name: payload.name.trim().to_string(),
        phone: payload.phone,
        email: payload.email,
        status: payload.status.unwrap_or(CollectorStatus::Idle),
        current_location: payload.current_location,
        location_history: payload.location_history,
        current_task,
        total_collected: payload.total_collected,
        tasks_completed: payload.tasks_completed,
        financial_year,
    };

    match state.collectors.entry(id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!("collector {} already exists", id)));
        }
        Entry::Vacant(slot) => {
            slot.insert(collector.clone());
        }
    }

    if let Some(task) = &collector.current_task {
        state.tasks.insert(task.id, task.clone());
    }
    state.metrics.roster_size.set(state.collectors.len() as i64);
    state.publish(RosterEvent::now(collector.id, RosterEventKind::Registered));

    info!(collector_id = %collector.id, name = %collector.name, "collector registered");
    Ok(Json(collector))
}

async fn list_collectors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Collector>> {
    let filter = RosterFilter::new(query.q.as_deref(), query.status.as_deref());
    Json(state.roster_snapshot(&filter))
}

async fn get_collector(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Collector>, AppError> {
    let collector = state.collectors.get(&id).ok_or_else(|| not_found(id))?;

    Ok(Json(collector.value().clone()))
}

async fn update_collector_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Collector>, AppError> {
    let updated = {
        let mut collector = state.collectors.get_mut(&id).ok_or_else(|| not_found(id))?;
        collector.status = payload.status;
        collector.clone()
    };

    state.publish(RosterEvent::now(id, RosterEventKind::StatusChanged));
    Ok(Json(updated))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<(StatusCode, Json<LocationAccepted>), AppError> {
    if !Coordinate::new(payload.lat, payload.lng).is_valid() {
        return Err(AppError::InvalidCoordinate {
            lat: payload.lat,
            lng: payload.lng,
        });
    }

    if !state.collectors.contains_key(&id) {
        return Err(not_found(id));
    }

    let mut location = Location::new(
        payload.lat,
        payload.lng,
        payload.timestamp.unwrap_or_else(Utc::now),
    );
    location.address = payload.address;

    enqueue_update(
        &state,
        LocationUpdate {
            collector_id: id,
            location,
            status: payload.status,
        },
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(LocationAccepted {
            collector_id: id,
            queued: true,
        }),
    ))
}

async fn set_current_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTaskRequest>,
) -> Result<Json<Collector>, AppError> {
    let task = match payload.task {
        Some(mut task) => {
            validate_task(&task)?;
            task.assigned_to = id;
            Some(task)
        }
        None => None,
    };

    let updated = {
        let mut collector = state.collectors.get_mut(&id).ok_or_else(|| not_found(id))?;
        collector.current_task = task.clone();
        collector.clone()
    };

    if let Some(task) = task {
        state.tasks.insert(task.id, task);
    }

    state.publish(RosterEvent::now(id, RosterEventKind::TaskChanged));
    Ok(Json(updated))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RouteResponse>, AppError> {
    let collector = state
        .collectors
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| not_found(id))?;

    let route = reconstruct(&collector)
        .ok_or_else(|| AppError::NotFound(format!("collector {} has no route history", id)))?;
    let summary = route.summary();

    Ok(Json(RouteResponse { route, summary }))
}
