pub mod bounds;

pub use bounds::GeoBounds;

use crate::models::collector::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points
        .windows(2)
        .map(|leg| haversine_km(&leg[0], &leg[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, path_length_km};
    use crate::models::collector::Coordinate;

    #[test]
    fn zero_distance_for_same_point() {
        let p = Coordinate::new(23.0225, 72.5714);
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn ahmedabad_to_mumbai_is_around_440_km() {
        let ahmedabad = Coordinate::new(23.0225, 72.5714);
        let mumbai = Coordinate::new(19.0760, 72.8777);
        let distance = haversine_km(&ahmedabad, &mumbai);
        assert!((distance - 440.0).abs() < 10.0);
    }

    #[test]
    fn path_length_sums_legs() {
        let a = Coordinate::new(23.0225, 72.5714);
        let b = Coordinate::new(23.0250, 72.5800);
        let c = Coordinate::new(23.0340, 72.5560);

        let total = path_length_km(&[a, b, c]);
        let expected = haversine_km(&a, &b) + haversine_km(&b, &c);
        assert!((total - expected).abs() < 1e-9);
        assert_eq!(path_length_km(&[a]), 0.0);
    }
}
