//! Coordinate value passed across the binaries' I/O boundaries.

use serde::{Deserialize, Serialize};

/// Geographic point (lon/lat), in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<GeoPoint> for geo_types::Coord<f64> {
    fn from(p: GeoPoint) -> Self {
        geo_types::Coord { x: p.lon, y: p.lat }
    }
}
