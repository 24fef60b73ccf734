//! Boundary record types as they appear in the polygon data file.

use std::str::FromStr;

/// Geometry kind named after the `=` in a data file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonType {
    /// A single ring
    Polygon,
    /// Several disjoint rings sharing one country code (islands, exclaves)
    MultiPolygon,
}

impl PolygonType {
    /// Keyword used in the data file
    pub fn keyword(&self) -> &'static str {
        match self {
            PolygonType::Polygon => "POLYGON",
            PolygonType::MultiPolygon => "MULTIPOLYGON",
        }
    }
}

impl std::fmt::Display for PolygonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for PolygonType {
    type Err = String;

    /// Case-insensitive, matching what the data file producers emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("POLYGON") {
            Ok(PolygonType::Polygon)
        } else if s.eq_ignore_ascii_case("MULTIPOLYGON") {
            Ok(PolygonType::MultiPolygon)
        } else {
            Err(format!("unrecognized polygon type '{}'", s))
        }
    }
}
