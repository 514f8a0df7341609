use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::map::markers::{
    client_icon, collector_icon, current_location_icon, route_direction_style,
    route_line_style, route_shadow_style, waypoint_icon, WaypointRole,
};
use crate::map::popup::{Popup, PopupContext};
use crate::map::route::{reconstruct, Route};
use crate::map::surface::{Layer, MapSurface, Marker, Overlay, OverlayId, Polyline, TileLayer};
use crate::map::viewport::{CameraCommand, ViewportController};
use crate::models::collector::Collector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Disposed,
}

#[derive(Debug, Clone)]
pub struct SurfaceSetup {
    pub satellite: TileLayer,
    pub labels: TileLayer,
    pub viewport: ViewportController,
    pub display_offset: FixedOffset,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub roster: &'a [Collector],
    pub selected: Option<Uuid>,
    pub show_clients: bool,
    pub show_route_history: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub collector_markers: usize,
    pub client_markers: usize,
    pub route_points: usize,
    pub waypoint_markers: usize,
    pub skipped: usize,
    pub camera: Option<CameraCommand>,
}

struct Mounted<S> {
    surface: S,
    tiles: Vec<OverlayId>,
    collector_markers: Vec<OverlayId>,
    client_markers: Vec<OverlayId>,
    route_lines: Vec<OverlayId>,
    waypoint_markers: Vec<OverlayId>,
    click_targets: HashMap<OverlayId, Uuid>,
}

enum Lifecycle<S> {
    Uninitialized,
    Ready(Box<Mounted<S>>),
    Disposed,
}

/// Owns a map surface and every overlay drawn on it.
///
/// Moves through Uninitialized, Ready and Disposed exactly once each.
/// Calls that do not fit the current state are ignored; dropping the
/// controller disposes it.
pub struct MapController<S: MapSurface> {
    setup: SurfaceSetup,
    lifecycle: Lifecycle<S>,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(setup: SurfaceSetup) -> Self {
        Self {
            setup,
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.lifecycle {
            Lifecycle::Uninitialized => LifecycleState::Uninitialized,
            Lifecycle::Ready(_) => LifecycleState::Ready,
            Lifecycle::Disposed => LifecycleState::Disposed,
        }
    }

    /// Takes ownership of `surface` and lays down the persistent tile layers.
    ///
    /// Returns false (and drops `surface` untouched) unless the controller
    /// was still uninitialized.
    pub fn mount(&mut self, mut surface: S) -> bool {
        if !matches!(self.lifecycle, Lifecycle::Uninitialized) {
            warn!(state = ?self.state(), "ignoring mount: surface already initialized");
            return false;
        }

        let tiles = vec![
            surface.add_overlay(Layer::Basemap, Overlay::Tiles(self.setup.satellite.clone())),
            surface.add_overlay(Layer::Labels, Overlay::Tiles(self.setup.labels.clone())),
        ];

        self.lifecycle = Lifecycle::Ready(Box::new(Mounted {
            surface,
            tiles,
            collector_markers: Vec::new(),
            client_markers: Vec::new(),
            route_lines: Vec::new(),
            waypoint_markers: Vec::new(),
            click_targets: HashMap::new(),
        }));

        info!("map surface mounted");
        true
    }

    pub fn surface(&self) -> Option<&S> {
        match &self.lifecycle {
            Lifecycle::Ready(mounted) => Some(&mounted.surface),
            _ => None,
        }
    }

    pub fn click_target(&self, overlay: OverlayId) -> Option<Uuid> {
        match &self.lifecycle {
            Lifecycle::Ready(mounted) => mounted.click_targets.get(&overlay).copied(),
            _ => None,
        }
    }

    /// Brings the surface in line with `input`. `None` when not Ready.
    pub fn reconcile(&mut self, input: &ReconcileInput<'_>) -> Option<ReconcileReport> {
        let Lifecycle::Ready(mounted) = &mut self.lifecycle else {
            debug!("reconcile skipped: surface not ready");
            return None;
        };

        let ctx = PopupContext {
            now: input.now,
            display_offset: self.setup.display_offset,
        };
        let mut skipped = 0;

        mounted.clear_markers();

        for collector in input.roster {
            let position = collector.current_location.point;
            if !position.is_valid() {
                warn!(
                    collector_id = %collector.id,
                    lat = position.lat,
                    lng = position.lng,
                    "skipping collector marker with invalid coordinate"
                );
                skipped += 1;
                continue;
            }

            let id = mounted.surface.add_overlay(
                Layer::CollectorMarkers,
                Overlay::Marker(Marker {
                    position,
                    icon: collector_icon(collector.status),
                    popup: Popup::for_collector(collector, &ctx),
                    click_target: Some(collector.id),
                }),
            );
            mounted.collector_markers.push(id);
            mounted.click_targets.insert(id, collector.id);
        }

        if input.show_clients {
            for collector in input.roster {
                let Some(task) = &collector.current_task else {
                    continue;
                };

                let position = task.client.location.point;
                if !position.is_valid() {
                    warn!(
                        collector_id = %collector.id,
                        client_id = %task.client.id,
                        "skipping client marker with invalid coordinate"
                    );
                    skipped += 1;
                    continue;
                }

                let id = mounted.surface.add_overlay(
                    Layer::ClientMarkers,
                    Overlay::Marker(Marker {
                        position,
                        icon: client_icon(),
                        popup: Popup::for_client(collector, task),
                        click_target: None,
                    }),
                );
                mounted.client_markers.push(id);
            }
        }

        mounted.clear_route();

        let selected = input
            .selected
            .and_then(|id| input.roster.iter().find(|collector| collector.id == id));

        let route = match selected {
            Some(collector) if input.show_route_history => reconstruct(collector),
            _ => None,
        };

        if let (Some(collector), Some(route)) = (selected, route.as_ref()) {
            mounted.draw_route(collector, route, &ctx);
            skipped += route.skipped_points;
        }

        let camera = self.setup.viewport.plan(input.roster, selected, route.as_ref());
        if let Some(command) = &camera {
            mounted.surface.apply_camera(command);
        }

        let report = ReconcileReport {
            collector_markers: mounted.collector_markers.len(),
            client_markers: mounted.client_markers.len(),
            route_points: route.as_ref().map_or(0, |route| route.points.len()),
            waypoint_markers: mounted.waypoint_markers.len(),
            skipped,
            camera,
        };

        debug!(
            collectors = report.collector_markers,
            clients = report.client_markers,
            route_points = report.route_points,
            skipped = report.skipped,
            "map reconciled"
        );

        Some(report)
    }

    /// Releases every overlay and the surface. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Disposed) {
            Lifecycle::Ready(mut mounted) => {
                mounted.clear_markers();
                mounted.clear_route();
                for id in mounted.tiles.drain(..) {
                    mounted.surface.remove_overlay(id);
                }
                mounted.surface.destroy();
                info!("map surface disposed");
            }
            Lifecycle::Uninitialized | Lifecycle::Disposed => {}
        }
    }
}

impl<S: MapSurface> Drop for MapController<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: MapSurface> Mounted<S> {
    fn clear_markers(&mut self) {
        for id in self
            .collector_markers
            .drain(..)
            .chain(self.client_markers.drain(..))
        {
            self.surface.remove_overlay(id);
        }
        self.click_targets.clear();
    }

    fn clear_route(&mut self) {
        for id in self
            .route_lines
            .drain(..)
            .chain(self.waypoint_markers.drain(..))
        {
            self.surface.remove_overlay(id);
        }
    }

    fn draw_route(&mut self, collector: &Collector, route: &Route, ctx: &PopupContext) {
        for (layer, style) in [
            (Layer::RouteShadow, route_shadow_style()),
            (Layer::RouteLine, route_line_style()),
            (Layer::RouteDirection, route_direction_style()),
        ] {
            let id = self.surface.add_overlay(
                layer,
                Overlay::Polyline(Polyline {
                    points: route.points.clone(),
                    style,
                }),
            );
            self.route_lines.push(id);
        }

        for waypoint in &route.waypoints {
            let icon = match waypoint.role {
                WaypointRole::Current => current_location_icon(),
                role => waypoint_icon(
                    waypoint.index,
                    role == WaypointRole::Start,
                    waypoint.client_visited.is_some(),
                ),
            };

            let id = self.surface.add_overlay(
                Layer::Waypoints,
                Overlay::Marker(Marker {
                    position: waypoint.position(),
                    icon,
                    popup: Popup::for_waypoint(waypoint, collector, ctx),
                    click_target: None,
                }),
            );
            self.waypoint_markers.push(id);
        }
    }
}
