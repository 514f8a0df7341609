use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::map::controller::ReconcileReport;
use crate::map::interaction::Legend;
use crate::map::session::MapSession;
use crate::map::surface::{Scene, SceneSurface};
use crate::models::collector::RosterFilter;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/map/scene", get(get_scene))
        .route("/map/legend", get(get_legend))
}

/// Everything a host needs to paint one reconcile.
#[derive(Debug, Serialize)]
pub struct SceneFrame {
    pub selected: Option<Uuid>,
    pub show_clients: bool,
    pub show_route_history: bool,
    pub report: Option<ReconcileReport>,
    pub scene: Option<Scene>,
    pub legend: Legend,
}

#[derive(Deserialize)]
pub struct SceneQuery {
    pub selected: Option<Uuid>,
    pub show_clients: Option<bool>,
    pub show_route_history: Option<bool>,
    pub q: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct LegendQuery {
    pub show_route_history: Option<bool>,
}

pub fn mount_session(state: &AppState) -> MapSession<SceneSurface> {
    let map = &state.config.map;
    MapSession::mount(
        map.surface_setup(),
        SceneSurface::new(map.default_center, map.default_zoom),
    )
}

pub fn render_scene(
    state: &AppState,
    session: &mut MapSession<SceneSurface>,
    trigger: &'static str,
) -> SceneFrame {
    let roster = state.roster_snapshot(session.filter());

    let timer = state
        .metrics
        .reconcile_latency_seconds
        .with_label_values(&[trigger])
        .start_timer();
    let report = session.render(&roster, Utc::now());
    timer.observe_duration();

    if let Some(report) = &report {
        state
            .metrics
            .skipped_overlays_total
            .inc_by(report.skipped as u64);
    }

    SceneFrame {
        selected: session.selected(),
        show_clients: session.show_clients(),
        show_route_history: session.show_route_history(),
        report,
        scene: session.scene(),
        legend: session.legend(),
    }
}

async fn get_scene(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SceneQuery>,
) -> Json<SceneFrame> {
    let mut session = mount_session(&state);
    session.select(query.selected);
    session.set_filter(RosterFilter::new(query.q.as_deref(), query.status.as_deref()));
    if let Some(visible) = query.show_clients {
        session.set_show_clients(visible);
    }
    if let Some(visible) = query.show_route_history {
        session.set_route_history(visible);
    }

    let frame = render_scene(&state, &mut session, "snapshot");
    session.dispose();

    Json(frame)
}

async fn get_legend(Query(query): Query<LegendQuery>) -> Json<Legend> {
    Json(Legend::new(query.show_route_history.unwrap_or(true)))
}
