//! Point-in-Polygon (PIP) country lookup.
//!
//! Parses country boundary rings from a polygon data file once, then answers
//! lookups with an exhaustive, ordered even-odd scan.

mod boundary;
mod error;
mod geometry;
mod service;
mod store;

pub use boundary::{parse_boundaries, parse_line, parse_ring, CountryBoundary, PolygonRing};
pub use error::BoundaryError;
pub use geometry::point_in_ring;
pub use service::PointLocator;
pub use store::{
    load_boundaries, read_boundaries, BoundaryStore, DATA_ENV_VAR, DEFAULT_DATA_FILE,
};
