//! Ear-clipping triangulation of simple polygons via `earcutr`.
//!
//! Input polygons use the canonical winding (clockwise, Y-up). earcut
//! expects the opposite convention, so the ring is reversed and mirrored
//! before clipping and the resulting indices are mapped back onto the
//! caller's vertex order.

use glam::DVec2;
use thiserror::Error;

use super::polygon::signed_area;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("ear clipping failed")]
    Earcut,

    #[error("ear clipping produced no triangles")]
    NoTriangles,
}

/// Triangulate a simple polygon. Indices refer to `points` as given; each
/// triangle is ordered clockwise.
pub fn triangulate(points: &[DVec2]) -> Result<Vec<[usize; 3]>, TriangulationError> {
    let n = points.len();
    if n < 3 {
        return Err(TriangulationError::TooFewVertices(n));
    }

    let coords: Vec<f64> = points
        .iter()
        .rev()
        .flat_map(|p| [p.x, -p.y])
        .collect();
    let flat = earcutr::earcut(&coords, &[], 2).map_err(|_| TriangulationError::Earcut)?;

    let triangles: Vec<[usize; 3]> = flat
        .chunks_exact(3)
        .map(|tri| {
            let mut t = [n - 1 - tri[0], n - 1 - tri[1], n - 1 - tri[2]];
            let area = signed_area(&[points[t[0]], points[t[1]], points[t[2]]]);
            if area > 0.0 {
                t.swap(1, 2);
            }
            t
        })
        .collect();

    if triangles.is_empty() {
        return Err(TriangulationError::NoTriangles);
    }
    Ok(triangles)
}

/// Total area covered by `triangles`.
pub fn triangles_area(points: &[DVec2], triangles: &[[usize; 3]]) -> f64 {
    triangles
        .iter()
        .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]).abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::ensure_clockwise;
    use crate::geometry::polygon::fixtures::{l_shape, regular};
    use approx::assert_abs_diff_eq;

    fn check_valid(points: &[DVec2]) {
        let triangles = triangulate(points).unwrap();
        assert_eq!(triangles.len(), points.len() - 2);
        for t in &triangles {
            assert!(t.iter().all(|&i| i < points.len()));
            let area = signed_area(&[points[t[0]], points[t[1]], points[t[2]]]);
            assert!(area <= 0.0, "triangle {:?} is not clockwise", t);
        }
        assert_abs_diff_eq!(
            triangles_area(points, &triangles),
            signed_area(points).abs(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn concave_l_shape() {
        check_valid(&ensure_clockwise(l_shape()));
    }

    #[test]
    fn either_input_winding() {
        check_valid(&l_shape());
        check_valid(&regular(9, 4.0));
    }

    #[test]
    fn comb_polygon() {
        let comb = ensure_clockwise(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(5.0, 0.0),
            DVec2::new(5.0, 3.0),
            DVec2::new(4.0, 3.0),
            DVec2::new(4.0, 1.0),
            DVec2::new(3.0, 1.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(2.0, 3.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 3.0),
            DVec2::new(0.0, 3.0),
        ]);
        check_valid(&comb);
    }

    #[test]
    fn too_few_vertices() {
        assert_eq!(
            triangulate(&[DVec2::ZERO, DVec2::X]),
            Err(TriangulationError::TooFewVertices(2))
        );
    }
}
