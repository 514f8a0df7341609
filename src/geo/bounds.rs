use serde::{Deserialize, Serialize};

use crate::models::collector::Coordinate;

/// Axis-aligned lat/lng rectangle. Padding is applied by the camera, not stored here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    pub fn from_point(point: Coordinate) -> Self {
        Self {
            min_lat: point.lat,
            min_lng: point.lng,
            max_lat: point.lat,
            max_lng: point.lng,
        }
    }

    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        points
            .into_iter()
            .filter(|point| point.is_valid())
            .fold(None, |bounds: Option<GeoBounds>, point| match bounds {
                Some(mut bounds) => {
                    bounds.extend(*point);
                    Some(bounds)
                }
                None => Some(GeoBounds::from_point(*point)),
            })
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.min_lat = self.min_lat.min(point.lat);
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::models::collector::Coordinate;

    fn roster_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(23.0340, 72.5560),
            Coordinate::new(23.0300, 72.5150),
            Coordinate::new(22.9950, 72.6000),
            Coordinate::new(23.0500, 72.5300),
        ]
    }

    #[test]
    fn encloses_every_input_point() {
        let points = roster_points();
        let bounds = GeoBounds::from_points(&points).unwrap();

        assert!(bounds.min_lat <= bounds.max_lat);
        assert!(bounds.min_lng <= bounds.max_lng);
        for point in &points {
            assert!(bounds.contains(point), "{point:?} outside {bounds:?}");
        }
        assert_eq!(bounds.min_lat, 22.9950);
        assert_eq!(bounds.max_lat, 23.0500);
        assert_eq!(bounds.min_lng, 72.5150);
        assert_eq!(bounds.max_lng, 72.6000);
    }

    #[test]
    fn empty_set_has_no_bounds() {
        let points: Vec<Coordinate> = Vec::new();
        assert!(GeoBounds::from_points(&points).is_none());
    }

    #[test]
    fn single_point_is_degenerate_but_present() {
        let point = Coordinate::new(23.0225, 72.5714);
        let bounds = GeoBounds::from_points([&point]).unwrap();
        assert_eq!(bounds.center(), point);
        assert!(bounds.contains(&point));
    }

    #[test]
    fn invalid_points_are_ignored() {
        let points = vec![
            Coordinate::new(f64::NAN, 72.0),
            Coordinate::new(23.0, 72.5),
            Coordinate::new(123.0, 72.0),
        ];
        let bounds = GeoBounds::from_points(&points).unwrap();
        assert_eq!(bounds, GeoBounds::from_point(Coordinate::new(23.0, 72.5)));

        let only_bad = vec![Coordinate::new(f64::INFINITY, 0.0)];
        assert!(GeoBounds::from_points(&only_bad).is_none());
    }
}
