//! Coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `true` when both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine distance between two points, in kilometres.
#[must_use]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero_distance() {
        let p = Coordinate::new(48.8566, 2.3522);
        assert!(distance_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn paris_to_versailles_is_about_17_km() {
        let paris = Coordinate::new(48.8566, 2.3522);
        let versailles = Coordinate::new(48.8049, 2.1204);
        let d = distance_km(paris, versailles);
        assert!((16.0..19.0).contains(&d), "unexpected distance {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(40.4168, -3.7038);
        let b = Coordinate::new(41.3874, 2.1686);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        assert!(Coordinate::new(10.0, 20.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
    }
}
