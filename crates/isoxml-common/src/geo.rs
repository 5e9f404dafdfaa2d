//! Geographic positions and unit-tagged quantities.

use serde::{Deserialize, Serialize};

/// Approximate length of one degree of latitude, in metres.
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Convert a north/east extent in metres at this latitude to degrees.
    ///
    /// Returns `None` at the poles, where an east extent has no finite size
    /// in degrees.
    pub fn metres_to_degrees(&self, north_m: f64, east_m: f64) -> Option<(f64, f64)> {
        let cos_lat = self.latitude.to_radians().cos();
        if cos_lat.abs() < 1e-12 {
            return None;
        }

        Some((
            north_m / METRES_PER_DEGREE,
            east_m / (METRES_PER_DEGREE * cos_lat),
        ))
    }

    /// Inverse of [`GeoPoint::metres_to_degrees`].
    pub fn degrees_to_metres(&self, north_deg: f64, east_deg: f64) -> (f64, f64) {
        let cos_lat = self.latitude.to_radians().cos();
        (
            north_deg * METRES_PER_DEGREE,
            east_deg * METRES_PER_DEGREE * cos_lat,
        )
    }
}

/// A numeric value tagged with the code of the unit it is expressed in.
///
/// The unit code is kept as text; resolving it to a physical unit happens in
/// the unit system. A quantity without a unit is dimensionless as far as
/// conversion is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Quantity {
    /// Create a quantity with a unit.
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: Some(unit.into()),
        }
    }

    /// Create a quantity without a unit.
    pub fn unitless(value: f64) -> Self {
        Self { value, unit: None }
    }
}
