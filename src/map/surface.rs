use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::map::markers::{LineStyle, MarkerIcon};
use crate::map::popup::Popup;
use crate::map::viewport::CameraCommand;
use crate::models::collector::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

/// Draw order, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Basemap,
    Labels,
    RouteShadow,
    RouteLine,
    RouteDirection,
    ClientMarkers,
    CollectorMarkers,
    Waypoints,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: Coordinate,
    pub icon: MarkerIcon,
    pub popup: Popup,
    /// Collector reported to the selection callback when this marker is clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_target: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<Coordinate>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    Tiles(TileLayer),
    Marker(Marker),
    Polyline(Polyline),
}

/// The rendering substrate the map controller drives.
///
/// Implementations own whatever native handles back an overlay; the
/// controller only ever sees the ids it was handed.
pub trait MapSurface {
    fn add_overlay(&mut self, layer: Layer, overlay: Overlay) -> OverlayId;

    /// Returns false if the id was not (or no longer) on the surface.
    fn remove_overlay(&mut self, id: OverlayId) -> bool;

    fn apply_camera(&mut self, command: &CameraCommand);

    /// Releases the surface itself. Called exactly once by the controller.
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneOverlay {
    pub id: OverlayId,
    pub layer: Layer,
    #[serde(flatten)]
    pub overlay: Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialView {
    pub center: Coordinate,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub initial_view: InitialView,
    pub camera: Option<CameraCommand>,
    pub overlays: Vec<SceneOverlay>,
}

impl Scene {
    pub fn count(&self, layer: Layer) -> usize {
        self.overlays
            .iter()
            .filter(|overlay| overlay.layer == layer)
            .count()
    }

    pub fn in_layer(&self, layer: Layer) -> impl Iterator<Item = &SceneOverlay> {
        self.overlays
            .iter()
            .filter(move |overlay| overlay.layer == layer)
    }
}

/// In-memory surface that records overlays so a host can render them.
#[derive(Debug)]
pub struct SceneSurface {
    initial_view: InitialView,
    next_id: u64,
    overlays: BTreeMap<OverlayId, (Layer, Overlay)>,
    camera: Option<CameraCommand>,
    camera_moves: u64,
    destroyed: bool,
}

impl SceneSurface {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            initial_view: InitialView { center, zoom },
            next_id: 1,
            overlays: BTreeMap::new(),
            camera: None,
            camera_moves: 0,
            destroyed: false,
        }
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn camera_moves(&self) -> u64 {
        self.camera_moves
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Overlays ordered by layer, then by insertion.
    pub fn snapshot(&self) -> Scene {
        let mut overlays: Vec<SceneOverlay> = self
            .overlays
            .iter()
            .map(|(id, (layer, overlay))| SceneOverlay {
                id: *id,
                layer: *layer,
                overlay: overlay.clone(),
            })
            .collect();
        overlays.sort_by_key(|overlay| (overlay.layer, overlay.id));

        Scene {
            initial_view: self.initial_view.clone(),
            camera: self.camera.clone(),
            overlays,
        }
    }
}

impl MapSurface for SceneSurface {
    fn add_overlay(&mut self, layer: Layer, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays.insert(id, (layer, overlay));
        id
    }

    fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.overlays.remove(&id).is_some()
    }

    fn apply_camera(&mut self, command: &CameraCommand) {
        self.camera = Some(command.clone());
        self.camera_moves += 1;
    }

    fn destroy(&mut self) {
        self.overlays.clear();
        self.camera = None;
        self.destroyed = true;
    }
}
