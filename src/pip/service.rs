//! Point locator: which country contains a coordinate.

use std::sync::Arc;

use geo_types::Coord;
use rayon::prelude::*;
use tracing::debug;

use super::boundary::CountryBoundary;
use super::error::BoundaryError;
use super::geometry::point_in_ring;
use super::BoundaryStore;
use crate::models::GeoPoint;

/// Linear-scan country lookup over a [`BoundaryStore`].
///
/// Holds no state beyond the store handle. Fragments are tested in file
/// order and the first containing ring wins.
#[derive(Debug, Clone)]
pub struct PointLocator {
    store: Arc<BoundaryStore>,
}

impl PointLocator {
    pub fn new(store: Arc<BoundaryStore>) -> Self {
        Self { store }
    }

    /// Country code of the first ring containing (`lon`, `lat`), or `None`.
    ///
    /// Only load errors from the store are returned; a point outside every
    /// ring is not an error.
    pub fn lookup(&self, lon: f64, lat: f64) -> Result<Option<&str>, BoundaryError> {
        let boundaries = self.store.data()?;
        let country = first_match(boundaries, Coord { x: lon, y: lat });

        debug!("Lookup at ({}, {}): {:?}", lon, lat, country);

        Ok(country)
    }

    /// Resolve many points in parallel. Results keep the input order.
    pub fn lookup_batch(&self, points: &[GeoPoint]) -> Result<Vec<Option<&str>>, BoundaryError> {
        let boundaries = self.store.data()?;

        Ok(points
            .par_iter()
            .map(|p| first_match(boundaries, Coord::from(*p)))
            .collect())
    }

    /// Get the underlying store (for stats/debugging)
    pub fn store(&self) -> &BoundaryStore {
        &self.store
    }
}

fn first_match(boundaries: &[CountryBoundary], target: Coord<f64>) -> Option<&str> {
    boundaries
        .iter()
        .find(|b| point_in_ring(target, b.ring.vertices()))
        .map(|b| b.country_code.as_str())
}
