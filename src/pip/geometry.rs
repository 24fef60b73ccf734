//! Point-in-polygon test over a single ring.
//!
//! Works in planar lon/lat degree space using the even-odd (ray casting)
//! rule. Points exactly on an edge may land either way.
//!
//! See: http://alienryderflex.com/polygon/

use geo_types::Coord;

/// Vertices further than this many whole degrees from the target, on either
/// axis, rule the whole ring out.
const MAX_AXIS_DISTANCE: f64 = 90.0;

/// Returns `true` if `target` lies inside the ring formed by `ring`.
///
/// The last vertex is treated as adjacent to the first, so rings need no
/// closing duplicate. Rings with fewer than three vertices never contain
/// anything.
pub fn point_in_ring(target: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    if ring.iter().any(|vertex| too_far(target, *vertex)) {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);

    for (i, vi) in ring.iter().enumerate() {
        let vj = ring[j];

        let crosses = (vi.y < target.y && vj.y >= target.y)
            || (vj.y < target.y && vi.y >= target.y);

        // Division is safe: a crossing edge never has vi.y == vj.y.
        if crosses
            && (vi.x <= target.x || vj.x <= target.x)
            && vi.x + (target.y - vi.y) / (vj.y - vi.y) * (vj.x - vi.x) < target.x
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Early reject: a vertex more than a quarter turn away on either axis.
///
/// An axis is only checked when the target coordinate on it is non-zero,
/// and the distance is truncated to whole degrees before comparing. Rings
/// straddling the antimeridian can be rejected wrongly; lookups accept that.
fn too_far(target: Coord<f64>, vertex: Coord<f64>) -> bool {
    (target.y != 0.0 && (vertex.y - target.y).abs().trunc() > MAX_AXIS_DISTANCE)
        || (target.x != 0.0 && (vertex.x - target.x).abs().trunc() > MAX_AXIS_DISTANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn unit_square() -> Vec<Coord<f64>> {
        vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0), c(1.0, 0.0)]
    }

    #[test]
    fn test_inside_unit_square() {
        let ring = unit_square();
        for &(x, y) in &[(0.5, 0.5), (0.1, 0.1), (0.9, 0.9), (0.01, 0.99), (0.99, 0.01)] {
            assert!(point_in_ring(c(x, y), &ring), "({}, {}) should be inside", x, y);
        }
    }

    #[test]
    fn test_outside_unit_square() {
        let ring = unit_square();
        for &(x, y) in &[(1.5, 0.5), (-0.5, 0.5), (0.5, 1.5), (0.5, -0.5), (2.0, 2.0)] {
            assert!(!point_in_ring(c(x, y), &ring), "({}, {}) should be outside", x, y);
        }
    }

    #[test]
    fn test_concave_ring() {
        // U shape open at the top between x=1 and x=2
        let ring = vec![
            c(0.0, 0.0),
            c(0.0, 3.0),
            c(1.0, 3.0),
            c(1.0, 1.0),
            c(2.0, 1.0),
            c(2.0, 3.0),
            c(3.0, 3.0),
            c(3.0, 0.0),
        ];
        assert!(point_in_ring(c(0.5, 2.0), &ring));
        assert!(point_in_ring(c(2.5, 2.0), &ring));
        assert!(point_in_ring(c(1.5, 0.5), &ring));
        assert!(!point_in_ring(c(1.5, 2.0), &ring));
    }

    #[test]
    fn test_closing_vertex_is_optional() {
        let mut closed = unit_square();
        closed.push(c(0.0, 0.0));
        assert!(point_in_ring(c(0.5, 0.5), &closed));
        assert!(!point_in_ring(c(1.5, 0.5), &closed));
    }

    #[test]
    fn test_early_reject_far_latitude() {
        let ring = vec![c(10.0, -50.0), c(10.0, 50.0), c(20.0, 50.0), c(20.0, -50.0)];
        assert!(point_in_ring(c(15.0, 30.0), &ring));
        // Inside by even-odd, but the -50 vertices are 95 degrees away
        assert!(!point_in_ring(c(15.0, 45.0), &ring));
        assert!(!point_in_ring(c(15.0, 150.0), &ring));
    }

    #[test]
    fn test_early_reject_far_longitude() {
        let ring = vec![c(-100.0, 0.0), c(-100.0, 10.0), c(100.0, 10.0), c(100.0, 0.0)];
        // Every vertex is 100 degrees away from x=0 but the check is skipped at zero
        assert!(point_in_ring(c(0.0, 5.0), &ring));
        assert!(!point_in_ring(c(1.0, 5.0), &ring));
    }

    #[test]
    fn test_early_reject_truncates_distance() {
        // 90.5 degrees truncates to 90, which does not exceed the cutoff
        let ring = vec![c(0.5, -90.0), c(0.5, 10.0), c(2.0, 10.0), c(2.0, -90.0)];
        assert!(point_in_ring(c(1.0, 0.5), &ring));
        let ring = vec![c(0.5, -91.0), c(0.5, 10.0), c(2.0, 10.0), c(2.0, -91.0)];
        assert!(!point_in_ring(c(1.0, 0.5), &ring));
    }

    #[test]
    fn test_far_point_horizontal_edges() {
        // Degenerate ring with equal y values everywhere must not divide by zero
        let ring = vec![c(0.0, 1.0), c(1.0, 1.0), c(2.0, 1.0)];
        assert!(!point_in_ring(c(1.0, 1.0), &ring));
        assert!(!point_in_ring(c(170.0, 1.0), &unit_square()));
    }

    #[test]
    fn test_degenerate_rings() {
        assert!(!point_in_ring(c(0.5, 0.5), &[]));
        assert!(!point_in_ring(c(0.5, 0.5), &[c(0.5, 0.5)]));
        assert!(!point_in_ring(c(0.5, 0.5), &[c(0.0, 0.0), c(1.0, 1.0)]));
    }
}
