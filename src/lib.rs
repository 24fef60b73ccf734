//! Countrypip - offline country lookup for a longitude/latitude pair
//!
//! This library provides the boundary store and point locator shared by the
//! query and tag binaries.

pub mod models;
pub mod pip;

use std::sync::OnceLock;

pub use models::{GeoPoint, PolygonType};
pub use pip::{BoundaryError, BoundaryStore, CountryBoundary, PointLocator, PolygonRing};

/// Country code containing (`longitude`, `latitude`), using the process-wide
/// boundary store.
///
/// The data file is read on first call from `$COUNTRYPIP_DATA`, falling back
/// to `polygons.properties` in the working directory. A failed load is
/// returned to the caller and retried on the next call.
pub fn get_country(longitude: f64, latitude: f64) -> Result<Option<String>, BoundaryError> {
    static LOCATOR: OnceLock<PointLocator> = OnceLock::new();

    let locator = LOCATOR.get_or_init(|| PointLocator::new(BoundaryStore::global()));
    Ok(locator.lookup(longitude, latitude)?.map(str::to_string))
}
