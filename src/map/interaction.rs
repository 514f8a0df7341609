use serde::Serialize;
use uuid::Uuid;

use crate::map::controller::MapController;
use crate::map::markers::{
    route_direction_style, route_line_style, waypoint_color, WaypointRole,
};
use crate::map::surface::{MapSurface, OverlayId};

pub type SelectionCallback = Box<dyn FnMut(Uuid) + Send>;

/// Routes marker clicks to the host's selection state and holds the
/// route-history toggle for one mounted map.
pub struct InteractionDispatcher {
    on_select: SelectionCallback,
    show_route_history: bool,
}

impl InteractionDispatcher {
    pub fn new(on_select: SelectionCallback) -> Self {
        Self {
            on_select,
            show_route_history: true,
        }
    }

    /// Forwards as-is; whether re-selecting deselects is the host's call.
    pub fn collector_clicked(&mut self, collector_id: Uuid) {
        (self.on_select)(collector_id);
    }

    /// Returns false for overlays that carry no collector.
    pub fn overlay_clicked<S: MapSurface>(
        &mut self,
        controller: &MapController<S>,
        overlay: OverlayId,
    ) -> bool {
        match controller.click_target(overlay) {
            Some(collector_id) => {
                self.collector_clicked(collector_id);
                true
            }
            None => false,
        }
    }

    pub fn show_route_history(&self) -> bool {
        self.show_route_history
    }

    pub fn set_route_history(&mut self, visible: bool) {
        self.show_route_history = visible;
    }

    pub fn toggle_route_history(&mut self) -> bool {
        self.show_route_history = !self.show_route_history;
        self.show_route_history
    }

    pub fn legend(&self) -> Legend {
        Legend::new(self.show_route_history)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineLegendEntry {
    pub label: &'static str,
    pub color: &'static str,
    pub dashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub show_route_history: bool,
    pub waypoints: Vec<LegendEntry>,
    pub lines: Vec<LineLegendEntry>,
}

impl Legend {
    pub fn new(show_route_history: bool) -> Self {
        let waypoint = |label, role| LegendEntry {
            label,
            color: waypoint_color(role),
        };
        let primary = route_line_style();
        let direction = route_direction_style();

        Self {
            show_route_history,
            waypoints: vec![
                waypoint("Start", WaypointRole::Start),
                waypoint("Stop", WaypointRole::Stop),
                waypoint("Client visit", WaypointRole::ClientVisit),
                waypoint("Current location", WaypointRole::Current),
            ],
            lines: vec![
                LineLegendEntry {
                    label: "Route path",
                    color: primary.color,
                    dashed: primary.dash_array.is_some(),
                },
                LineLegendEntry {
                    label: "Direction of travel",
                    color: direction.color,
                    dashed: direction.dash_array.is_some(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{FixedOffset, Utc};
    use uuid::Uuid;

    use super::InteractionDispatcher;
    use crate::map::controller::{MapController, ReconcileInput, SurfaceSetup};
    use crate::map::surface::{Layer, OverlayId, SceneSurface, TileLayer};
    use crate::map::viewport::ViewportController;
    use crate::models::collector::{Collector, CollectorStatus, Coordinate, Location};

    fn recorder() -> (InteractionDispatcher, Arc<Mutex<Vec<Uuid>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let dispatcher = InteractionDispatcher::new(Box::new(move |id| {
            sink.lock().unwrap().push(id);
        }));
        (dispatcher, seen)
    }

    #[test]
    fn route_history_defaults_on_and_toggles() {
        let (mut dispatcher, _) = recorder();
        assert!(dispatcher.show_route_history());
        assert!(!dispatcher.toggle_route_history());
        assert!(!dispatcher.legend().show_route_history);
        assert!(dispatcher.toggle_route_history());
    }

    #[test]
    fn clicks_forward_without_toggle_semantics() {
        let (mut dispatcher, seen) = recorder();
        let id = Uuid::from_u128(9);
        dispatcher.collector_clicked(id);
        dispatcher.collector_clicked(id);
        assert_eq!(*seen.lock().unwrap(), vec![id, id]);
    }

    #[test]
    fn overlay_click_resolves_collector() {
        let mut controller = MapController::new(SurfaceSetup {
            satellite: TileLayer {
                url_template: String::new(),
                attribution: String::new(),
                opacity: 1.0,
            },
            labels: TileLayer {
                url_template: String::new(),
                attribution: String::new(),
                opacity: 0.7,
            },
            viewport: ViewportController::default(),
            display_offset: FixedOffset::east_opt(0).unwrap(),
        });
        controller.mount(SceneSurface::new(Coordinate::new(23.0, 72.5), 12));

        let collector = Collector {
            id: Uuid::from_u128(5),
            name: "Kavita Reddy".to_string(),
            phone: String::new(),
            email: String::new(),
            status: CollectorStatus::Traveling,
            current_location: Location::new(23.03, 72.515, Utc::now()),
            location_history: Vec::new(),
            current_task: None,
            total_collected: 0.0,
            tasks_completed: 0,
            financial_year: "FY2024-25".to_string(),
        };
        let roster = vec![collector];
        controller.reconcile(&ReconcileInput {
            roster: &roster,
            selected: None,
            show_clients: true,
            show_route_history: true,
            now: Utc::now(),
        });

        let marker_id = controller
            .surface()
            .unwrap()
            .snapshot()
            .in_layer(Layer::CollectorMarkers)
            .next()
            .unwrap()
            .id;

        let (mut dispatcher, seen) = recorder();
        assert!(dispatcher.overlay_clicked(&controller, marker_id));
        assert!(!dispatcher.overlay_clicked(&controller, OverlayId(9_999)));
        assert_eq!(*seen.lock().unwrap(), vec![Uuid::from_u128(5)]);
    }

    #[test]
    fn legend_lists_every_waypoint_role() {
        let (dispatcher, _) = recorder();
        let legend = dispatcher.legend();
        assert_eq!(legend.waypoints.len(), 4);
        assert!(legend.lines.iter().any(|line| line.dashed));
        assert!(legend.lines.iter().any(|line| !line.dashed));
    }
}
