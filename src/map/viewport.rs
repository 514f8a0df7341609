use serde::Serialize;

use crate::geo::GeoBounds;
use crate::map::route::Route;
use crate::models::collector::{Collector, Coordinate};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraCommand {
    FitBounds {
        bounds: GeoBounds,
        padding_px: u32,
        animate: bool,
    },
    CenterOn {
        center: Coordinate,
        zoom: u8,
        animate: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    pub fit_padding_px: u32,
    pub route_padding_px: u32,
    pub selected_zoom: u8,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self {
            fit_padding_px: 50,
            route_padding_px: 60,
            selected_zoom: 15,
        }
    }
}

impl ViewportController {
    /// `route` is the route currently drawn for `selected`, if any.
    ///
    /// `None` means leave the camera where it is.
    pub fn plan(
        &self,
        roster: &[Collector],
        selected: Option<&Collector>,
        route: Option<&Route>,
    ) -> Option<CameraCommand> {
        if let Some(collector) = selected {
            if let Some(bounds) = route.and_then(Route::bounds) {
                return Some(CameraCommand::FitBounds {
                    bounds,
                    padding_px: self.route_padding_px,
                    animate: true,
                });
            }

            let center = collector.current_location.point;
            if center.is_valid() {
                return Some(CameraCommand::CenterOn {
                    center,
                    zoom: self.selected_zoom,
                    animate: true,
                });
            }
        }

        let bounds =
            GeoBounds::from_points(roster.iter().map(|collector| &collector.current_location.point))?;

        Some(CameraCommand::FitBounds {
            bounds,
            padding_px: self.fit_padding_px,
            animate: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{CameraCommand, ViewportController};
    use crate::map::route::reconstruct;
    use crate::models::collector::{
        Collector, CollectorStatus, Coordinate, Location, LocationHistoryEntry,
    };

    fn collector(seed: u128, lat: f64, lng: f64, history: &[(f64, f64)]) -> Collector {
        Collector {
            id: Uuid::from_u128(seed),
            name: format!("collector-{seed}"),
            phone: String::new(),
            email: String::new(),
            status: CollectorStatus::Active,
            current_location: Location::new(lat, lng, Utc::now()),
            location_history: history
                .iter()
                .map(|(lat, lng)| LocationHistoryEntry {
                    location: Location::new(*lat, *lng, Utc::now()),
                    duration_minutes: 10,
                    client_visited: None,
                })
                .collect(),
            current_task: None,
            total_collected: 0.0,
            tasks_completed: 0,
            financial_year: "FY2024-25".to_string(),
        }
    }

    #[test]
    fn empty_roster_leaves_camera_alone() {
        let viewport = ViewportController::default();
        assert_eq!(viewport.plan(&[], None, None), None);
    }

    #[test]
    fn no_selection_fits_everyone() {
        let roster = vec![
            collector(1, 23.034, 72.556, &[]),
            collector(2, 22.995, 72.600, &[]),
        ];
        let viewport = ViewportController::default();

        match viewport.plan(&roster, None, None) {
            Some(CameraCommand::FitBounds {
                bounds, padding_px, ..
            }) => {
                assert_eq!(padding_px, 50);
                for c in &roster {
                    assert!(bounds.contains(&c.current_location.point));
                }
            }
            other => panic!("expected fit, got {other:?}"),
        }
    }

    #[test]
    fn selection_without_route_centers_close() {
        let roster = vec![collector(1, 23.034, 72.556, &[])];
        let viewport = ViewportController::default();

        assert_eq!(
            viewport.plan(&roster, Some(&roster[0]), None),
            Some(CameraCommand::CenterOn {
                center: Coordinate::new(23.034, 72.556),
                zoom: 15,
                animate: true,
            })
        );
    }

    #[test]
    fn visible_route_overrides_centering() {
        let selected = collector(1, 23.034, 72.556, &[(23.0225, 72.5714), (23.025, 72.58)]);
        let route = reconstruct(&selected).unwrap();
        let roster = vec![selected.clone()];
        let viewport = ViewportController::default();

        match viewport.plan(&roster, Some(&selected), Some(&route)) {
            Some(CameraCommand::FitBounds {
                bounds, padding_px, ..
            }) => {
                assert_eq!(padding_px, 60);
                for point in &route.points {
                    assert!(bounds.contains(point));
                }
            }
            other => panic!("expected route fit, got {other:?}"),
        }
    }

    #[test]
    fn roster_of_invalid_points_is_a_no_op() {
        let roster = vec![collector(1, f64::NAN, 72.5, &[])];
        let viewport = ViewportController::default();
        assert_eq!(viewport.plan(&roster, None, None), None);
    }
}
