//! Great-circle distance on a spherical earth.
//!
//! The same formula backs the `central_angle` SQL function in the listings
//! migration, so the in-memory store and Postgres agree on which listings fall
//! inside a radius.

use serde::{Deserialize, Serialize};

/// Equatorial earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine central angle between two points, in radians.
pub fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Circle on the sphere: all points within `radius_km` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl GeoRadius {
    /// Radius expressed as an angle, `radius_km / EARTH_RADIUS_KM`.
    pub fn angular_radius(&self) -> f64 {
        self.radius_km / EARTH_RADIUS_KM
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        central_angle(self.center, point) <= self.angular_radius()
    }
}
