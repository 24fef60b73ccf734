//! Country boundary fragments and the polygon data file grammar.
//!
//! Each non-empty line of the data file has the shape
//! `CODE=TYPE (coordinates)`, where `TYPE` is `POLYGON` or `MULTIPOLYGON`
//! and the coordinates are comma-separated `lon lat` pairs. Multipolygon
//! payloads separate their rings with `)),((`.

use geo_types::Coord;
use tracing::debug;

use super::error::BoundaryError;
use super::geometry::point_in_ring;
use crate::models::PolygonType;

/// Separator between the rings of a MULTIPOLYGON payload
const RING_SEPARATOR: &str = ")),((";

/// One closed ring of (lon, lat) vertices.
///
/// The ring is implicitly closed: the last vertex connects back to the
/// first. Closure and self-intersection are not validated.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRing(Vec<Coord<f64>>);

impl PolygonRing {
    pub fn new(vertices: Vec<Coord<f64>>) -> Self {
        Self(vertices)
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Even-odd containment test in planar degree space
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        point_in_ring(Coord { x: lon, y: lat }, &self.0)
    }
}

impl From<Vec<Coord<f64>>> for PolygonRing {
    fn from(vertices: Vec<Coord<f64>>) -> Self {
        Self::new(vertices)
    }
}

/// A single (country code, ring) pair: the unit scanned by lookups.
///
/// A country drawn as a MULTIPOLYGON shows up as several of these sharing
/// the same code.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryBoundary {
    pub country_code: String,
    pub ring: PolygonRing,
}

impl CountryBoundary {
    pub fn new(country_code: impl Into<String>, ring: impl Into<PolygonRing>) -> Self {
        Self {
            country_code: country_code.into(),
            ring: ring.into(),
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.ring.contains(lon, lat)
    }
}

/// Parse a whole data file into boundary fragments, in file order.
///
/// Blank lines are skipped. The first malformed line aborts the parse;
/// no partial list is returned.
pub fn parse_boundaries(text: &str) -> Result<Vec<CountryBoundary>, BoundaryError> {
    let mut boundaries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let line_no = idx + 1;
        let fragments = parse_line(line).map_err(|reason| BoundaryError::parse(line_no, reason))?;
        boundaries.extend(fragments);
    }

    debug!("Parsed {} boundary fragments", boundaries.len());

    Ok(boundaries)
}

/// Parse one trimmed, non-empty record into its boundary fragments.
pub fn parse_line(line: &str) -> Result<Vec<CountryBoundary>, String> {
    let (country_code, rest) = line
        .split_once('=')
        .ok_or_else(|| "missing '=' after country code".to_string())?;

    let (type_token, payload) = rest
        .split_once(' ')
        .ok_or_else(|| "missing space between polygon type and coordinates".to_string())?;

    let polygon_type: PolygonType = type_token.parse()?;

    let payload = payload.trim().trim_matches('(').trim_matches(')');

    match polygon_type {
        PolygonType::Polygon => Ok(vec![CountryBoundary::new(country_code, parse_ring(payload))]),
        PolygonType::MultiPolygon => Ok(payload
            .split(RING_SEPARATOR)
            .map(|segment| CountryBoundary::new(country_code, parse_ring(segment)))
            .collect()),
    }
}

/// Parse a comma-separated list of `x y` pairs into a ring.
///
/// Decoding is lenient: each value is read from its leading numeric prefix
/// and a missing or non-numeric value becomes 0. Stray parentheses from
/// inner rings therefore end up as extra vertices instead of failing the
/// load. Values beyond the first two in a pair (e.g. an elevation) are
/// ignored.
pub fn parse_ring(coords: &str) -> PolygonRing {
    PolygonRing::new(coords.split(',').map(parse_coord).collect())
}

fn parse_coord(pair: &str) -> Coord<f64> {
    let mut parts = pair.split_whitespace();
    let x = parts.next().map_or(0.0, leading_float);
    let y = parts.next().map_or(0.0, leading_float);
    Coord { x, y }
}

/// Longest numeric prefix of `token` as a float, or 0 if there is none.
fn leading_float(token: &str) -> f64 {
    let end = token
        .find(|c: char| !matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .unwrap_or(token.len());

    (1..=end)
        .rev()
        .find_map(|len| token[..len].parse::<f64>().ok())
        .unwrap_or(0.0)
}
