//! Spherical-earth geodesy helpers.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean earth radius used by every conversion in the crate.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
    #[error("latitude {0} is too close to a pole for the tile grid")]
    Polar(f64),
    #[error("accuracy {0} must be a non-negative number of meters")]
    Accuracy(f64),
}

/// A WGS84-ish coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validated constructor for input arriving from outside the core.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

pub fn to_radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

pub fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Meters spanned by one degree of latitude anywhere on the sphere.
pub fn meters_per_degree_lat() -> f64 {
    2.0 * PI * EARTH_RADIUS_M / 360.0
}

/// Meters spanned by one degree of longitude at `lat`; shrinks toward the poles.
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    meters_per_degree_lat() * to_radians(lat).cos()
}

/// Great-circle distance using the haversine formula.
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = to_radians(b.lat - a.lat);
    let d_lng = to_radians(b.lng - a.lng);
    let sin_lat = (d_lat / 2.0).sin();
    let sin_lng = (d_lng / 2.0).sin();
    let h = sin_lat * sin_lat
        + to_radians(a.lat).cos() * to_radians(b.lat).cos() * sin_lng * sin_lng;
    EARTH_RADIUS_M * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}
