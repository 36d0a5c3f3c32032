//! Basic polygon measures: orientation, centroid, convexity.
//!
//! Sign convention: positive signed area means counter-clockwise in a Y-up
//! frame. The canonical winding for exported hulls is clockwise in physics
//! space (signed area ≤ 0).

use glam::DVec2;

/// Cross products smaller than this are treated as collinear.
pub const COLLINEAR_EPSILON: f64 = 1e-6;

/// Shoelace signed area.
pub fn signed_area(points: &[DVec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        sum += points[j].x * points[i].y - points[i].x * points[j].y;
        j = i;
    }
    0.5 * sum
}

/// Reverse `points` if needed so that the signed area is ≤ 0.
pub fn ensure_clockwise(mut points: Vec<DVec2>) -> Vec<DVec2> {
    if signed_area(&points) > 0.0 {
        points.reverse();
    }
    points
}

/// Reverse `points` if needed so that the signed area is ≥ 0.
pub fn ensure_ccw(mut points: Vec<DVec2>) -> Vec<DVec2> {
    if signed_area(&points) < 0.0 {
        points.reverse();
    }
    points
}

/// Arithmetic mean of the vertices.
pub fn centroid(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

/// Re-express vertices relative to their mean. Returns `(mean, centered)`.
pub fn center_on_centroid(points: &[DVec2]) -> (DVec2, Vec<DVec2>) {
    let offset = centroid(points);
    let centered = points.iter().map(|&p| p - offset).collect();
    (offset, centered)
}

/// `true` when every non-negligible turn has the same direction.
pub fn is_convex(points: &[DVec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b - a).perp_dot(c - b);
        if cross.abs() < COLLINEAR_EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Distance from `p` to the segment `a..b` (to `a` when the segment is degenerate).
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Axis-aligned bounds `(min, max)`, or `None` for an empty slice.
pub fn bounds(points: &[DVec2]) -> Option<(DVec2, DVec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
    )
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn signed_area_sign_follows_winding() {
        let ccw = square(2.0);
        assert_abs_diff_eq!(signed_area(&ccw), 4.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert_abs_diff_eq!(signed_area(&cw), -4.0);
    }

    #[test]
    fn winding_normalization_is_idempotent() {
        for poly in [square(3.0), l_shape(), regular(7, 5.0)] {
            let cw = ensure_clockwise(poly.clone());
            assert!(signed_area(&cw) <= 0.0);
            assert_eq!(ensure_clockwise(cw.clone()), cw);

            let ccw = ensure_ccw(poly);
            assert!(signed_area(&ccw) >= 0.0);
            assert_eq!(ensure_ccw(ccw.clone()), ccw);
        }
    }

    #[test]
    fn centering_round_trip() {
        let poly = vec![
            DVec2::new(3.5, -1.25),
            DVec2::new(10.0, 4.0),
            DVec2::new(-2.0, 7.75),
            DVec2::new(0.125, 0.0),
        ];
        let (offset, centered) = center_on_centroid(&poly);
        for (q, p) in centered.iter().zip(&poly) {
            assert_abs_diff_eq!(q.x + offset.x, p.x, epsilon = 1e-9);
            assert_abs_diff_eq!(q.y + offset.y, p.y, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(centroid(&centered).length(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn convexity() {
        assert!(is_convex(&square(1.0)));
        assert!(is_convex(&regular(6, 10.0)));
        assert!(!is_convex(&l_shape()));

        let mut reversed = regular(6, 10.0);
        reversed.reverse();
        assert!(is_convex(&reversed));
    }

    #[test]
    fn collinear_vertices_do_not_break_convexity() {
        let poly = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        assert!(is_convex(&poly));
    }

    #[test]
    fn degenerate_inputs_are_not_convex() {
        assert!(!is_convex(&[DVec2::ZERO, DVec2::X]));
        assert!(!is_convex(&[DVec2::ZERO, DVec2::X, DVec2::X * 2.0]));
    }

    #[test]
    fn segment_distance() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        assert_abs_diff_eq!(distance_to_segment(DVec2::new(5.0, 3.0), a, b), 3.0);
        assert_abs_diff_eq!(distance_to_segment(DVec2::new(-4.0, 3.0), a, b), 5.0);
        assert_abs_diff_eq!(distance_to_segment(DVec2::new(1.0, 1.0), a, a), 2f64.sqrt());
    }

    #[test]
    fn bounds_of_points() {
        let (lo, hi) = bounds(&l_shape()).unwrap();
        assert_eq!(lo, DVec2::ZERO);
        assert_eq!(hi, DVec2::new(2.0, 2.0));
        assert!(bounds(&[]).is_none());
    }
}
