use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::map::controller::{LifecycleState, MapController, ReconcileInput, ReconcileReport, SurfaceSetup};
use crate::map::interaction::{InteractionDispatcher, Legend};
use crate::map::surface::{MapSurface, OverlayId, Scene, SceneSurface};
use crate::models::collector::{Collector, RosterFilter};

/// One mounted map view: the host-side state (selection, client toggle,
/// roster filter) around a controller and its dispatcher.
///
/// Everything runs on the caller's task, so reconciles are naturally
/// serialized in the order the caller issues them.
pub struct MapSession<S: MapSurface> {
    controller: MapController<S>,
    dispatcher: InteractionDispatcher,
    selections: mpsc::UnboundedReceiver<Uuid>,
    selected: Option<Uuid>,
    show_clients: bool,
    filter: RosterFilter,
}

impl<S: MapSurface> MapSession<S> {
    pub fn mount(setup: SurfaceSetup, surface: S) -> Self {
        let (selection_tx, selections) = mpsc::unbounded_channel();
        let dispatcher = InteractionDispatcher::new(Box::new(move |collector_id| {
            let _ = selection_tx.send(collector_id);
        }));

        let mut controller = MapController::new(setup);
        controller.mount(surface);

        Self {
            controller,
            dispatcher,
            selections,
            selected: None,
            show_clients: true,
            filter: RosterFilter::default(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.controller.state()
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn select(&mut self, collector_id: Option<Uuid>) {
        self.selected = collector_id;
    }

    /// Returns true when the overlay was a collector marker.
    pub fn click(&mut self, overlay: OverlayId) -> bool {
        let hit = self.dispatcher.overlay_clicked(&self.controller, overlay);
        while let Ok(collector_id) = self.selections.try_recv() {
            self.selected = Some(collector_id);
        }
        hit
    }

    pub fn show_route_history(&self) -> bool {
        self.dispatcher.show_route_history()
    }

    pub fn set_route_history(&mut self, visible: bool) {
        self.dispatcher.set_route_history(visible);
    }

    pub fn toggle_route_history(&mut self) -> bool {
        self.dispatcher.toggle_route_history()
    }

    pub fn show_clients(&self) -> bool {
        self.show_clients
    }

    pub fn set_show_clients(&mut self, visible: bool) {
        self.show_clients = visible;
    }

    pub fn filter(&self) -> &RosterFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: RosterFilter) {
        self.filter = filter;
    }

    pub fn legend(&self) -> Legend {
        self.dispatcher.legend()
    }

    /// `roster` is expected to already be narrowed by [`Self::filter`].
    pub fn render(&mut self, roster: &[Collector], now: DateTime<Utc>) -> Option<ReconcileReport> {
        self.controller.reconcile(&ReconcileInput {
            roster,
            selected: self.selected,
            show_clients: self.show_clients,
            show_route_history: self.dispatcher.show_route_history(),
            now,
        })
    }

    pub fn dispose(&mut self) {
        self.controller.dispose();
    }
}

impl MapSession<SceneSurface> {
    pub fn scene(&self) -> Option<Scene> {
        self.controller.surface().map(SceneSurface::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use uuid::Uuid;

    use super::MapSession;
    use crate::map::controller::{LifecycleState, SurfaceSetup};
    use crate::map::surface::{Layer, SceneSurface, TileLayer};
    use crate::map::viewport::ViewportController;
    use crate::models::collector::{
        Collector, CollectorStatus, Coordinate, Location, LocationHistoryEntry,
    };

    fn session() -> MapSession<SceneSurface> {
        let tiles = TileLayer {
            url_template: String::new(),
            attribution: String::new(),
            opacity: 1.0,
        };
        MapSession::mount(
            SurfaceSetup {
                satellite: tiles.clone(),
                labels: tiles,
                viewport: ViewportController::default(),
                display_offset: FixedOffset::east_opt(19_800).unwrap(),
            },
            SceneSurface::new(Coordinate::new(23.0225, 72.5714), 12),
        )
    }

    fn collector() -> Collector {
        Collector {
            id: Uuid::from_u128(3),
            name: "Rahul Kumar".to_string(),
            phone: String::new(),
            email: String::new(),
            status: CollectorStatus::Idle,
            current_location: Location::new(22.995, 72.6, Utc::now()),
            location_history: vec![LocationHistoryEntry {
                location: Location::new(23.01, 72.565, Utc::now()),
                duration_minutes: 55,
                client_visited: None,
            }],
            current_task: None,
            total_collected: 0.0,
            tasks_completed: 0,
            financial_year: "FY2024-25".to_string(),
        }
    }

    #[test]
    fn clicking_a_marker_selects_and_draws_route() {
        let mut session = session();
        let roster = vec![collector()];
        session.render(&roster, Utc::now()).unwrap();

        let marker = session
            .scene()
            .unwrap()
            .in_layer(Layer::CollectorMarkers)
            .next()
            .unwrap()
            .id;
        assert!(session.click(marker));
        assert_eq!(session.selected(), Some(Uuid::from_u128(3)));

        let report = session.render(&roster, Utc::now()).unwrap();
        assert_eq!(report.route_points, 2);

        assert!(!session.toggle_route_history());
        let report = session.render(&roster, Utc::now()).unwrap();
        assert_eq!(report.route_points, 0);
        assert_eq!(session.scene().unwrap().count(Layer::Waypoints), 0);
    }

    #[test]
    fn route_history_can_be_set_explicitly() {
        let mut session = session();
        let roster = vec![collector()];
        session.select(Some(Uuid::from_u128(3)));

        session.set_route_history(false);
        session.set_route_history(false);
        assert!(!session.show_route_history());
        let report = session.render(&roster, Utc::now()).unwrap();
        assert_eq!(report.route_points, 0);
        assert!(!session.legend().show_route_history);

        session.set_route_history(true);
        let report = session.render(&roster, Utc::now()).unwrap();
        assert_eq!(report.route_points, 2);
    }

    #[test]
    fn dispose_stops_rendering() {
        let mut session = session();
        session.dispose();
        session.dispose();

        assert_eq!(session.state(), LifecycleState::Disposed);
        assert!(session.render(&[collector()], Utc::now()).is_none());
        assert!(session.scene().is_none());
    }
}
