//! Core data models shared by the library and the binaries.

pub mod country;
pub mod point;

pub use country::PolygonType;
pub use point::GeoPoint;
