//! Live collector map: markers, routes, camera and the overlay lifecycle.

pub mod controller;
pub mod interaction;
pub mod markers;
pub mod popup;
pub mod route;
pub mod session;
pub mod surface;
pub mod viewport;

pub use controller::{LifecycleState, MapController, ReconcileInput, ReconcileReport, SurfaceSetup};
pub use interaction::{InteractionDispatcher, Legend};
pub use route::{reconstruct, reconstruct_route, Route, RouteSummary, Waypoint};
pub use session::MapSession;
pub use surface::{Layer, MapSurface, Overlay, OverlayId, Scene, SceneSurface};
pub use viewport::{CameraCommand, ViewportController};
