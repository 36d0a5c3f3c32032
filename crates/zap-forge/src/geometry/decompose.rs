//! Convex decomposition (Hertel-Mehlhorn).
//!
//! The polygon is triangulated, then adjacent pieces are greedily merged
//! across their shared diagonal whenever the union stays convex. The result
//! has at most four times the optimal number of parts, which is plenty for
//! collider authoring.

use glam::DVec2;
use thiserror::Error;

use super::polygon::{ensure_clockwise, is_convex};
use super::triangulate::{triangulate, TriangulationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecomposeError {
    #[error("convex decomposition failed: {0}")]
    Triangulation(#[from] TriangulationError),

    #[error("convex decomposition produced no parts")]
    Empty,
}

/// Split a simple polygon into convex parts, each wound clockwise.
///
/// Convex input and triangles come back unchanged as a single part.
pub fn decompose(points: &[DVec2]) -> Result<Vec<Vec<DVec2>>, DecomposeError> {
    let polygon = ensure_clockwise(points.to_vec());
    if polygon.len() <= 3 || is_convex(&polygon) {
        return Ok(vec![polygon]);
    }

    let mut pieces: Vec<Vec<usize>> = triangulate(&polygon)?
        .into_iter()
        .map(|t| t.to_vec())
        .collect();

    while let Some((i, j, merged)) = find_merge(&pieces, &polygon) {
        pieces[i] = merged;
        pieces.swap_remove(j);
    }

    if pieces.is_empty() {
        return Err(DecomposeError::Empty);
    }
    Ok(pieces
        .into_iter()
        .map(|piece| piece.into_iter().map(|i| polygon[i]).collect())
        .collect())
}

fn find_merge(pieces: &[Vec<usize>], points: &[DVec2]) -> Option<(usize, usize, Vec<usize>)> {
    for i in 0..pieces.len() {
        for j in (i + 1)..pieces.len() {
            if let Some(merged) = merge_across_diagonal(&pieces[i], &pieces[j]) {
                let ring: Vec<DVec2> = merged.iter().map(|&k| points[k]).collect();
                if is_convex(&ring) {
                    return Some((i, j, merged));
                }
            }
        }
    }
    None
}

/// Join two equally wound index rings that share an edge. `a` walks the
/// edge as `u → v`, `b` as `v → u`.
fn merge_across_diagonal(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let (na, nb) = (a.len(), b.len());
    for k in 0..na {
        let (u, v) = (a[k], a[(k + 1) % na]);
        let Some(m) = (0..nb).find(|&m| b[m] == v && b[(m + 1) % nb] == u) else {
            continue;
        };
        let mut merged = Vec::with_capacity(na + nb - 2);
        // v .. u around `a`
        merged.extend((0..na).map(|s| a[(k + 1 + s) % na]));
        // strictly between u and v around `b`
        merged.extend((0..nb - 2).map(|s| b[(m + 2 + s) % nb]));
        return Some(merged);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::fixtures::{l_shape, regular, square};
    use crate::geometry::polygon::signed_area;
    use approx::assert_abs_diff_eq;

    #[test]
    fn l_shape_splits_into_convex_parts() {
        let poly = l_shape();
        let parts = decompose(&poly).unwrap();
        assert!(parts.len() >= 2);
        for part in &parts {
            assert!(is_convex(part), "part {:?} is not convex", part);
            assert!(signed_area(part) <= 0.0);
        }
        let total: f64 = parts.iter().map(|p| signed_area(p).abs()).sum();
        assert_abs_diff_eq!(total, signed_area(&poly).abs(), epsilon = 1e-9);
    }

    #[test]
    fn convex_input_is_single_part() {
        let parts = decompose(&regular(8, 3.0)).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].len(), 8);

        assert_eq!(decompose(&square(1.0)).unwrap().len(), 1);
    }

    #[test]
    fn star_decomposes() {
        let star: Vec<DVec2> = (0..10)
            .map(|i| {
                let r = if i % 2 == 0 { 10.0 } else { 4.0 };
                let a = i as f64 / 10.0 * std::f64::consts::TAU;
                DVec2::new(a.cos(), a.sin()) * r
            })
            .collect();
        let parts = decompose(&star).unwrap();
        assert!(parts.len() >= 5);
        assert!(parts.iter().all(|p| is_convex(p)));
        let total: f64 = parts.iter().map(|p| signed_area(p).abs()).sum();
        assert_abs_diff_eq!(total, signed_area(&star).abs(), epsilon = 1e-9);
    }

    #[test]
    fn merge_joins_shared_edge() {
        // Two clockwise triangles of a unit square sharing the 0-2 diagonal.
        let a = [0, 2, 1];
        let b = [0, 3, 2];
        let merged = merge_across_diagonal(&a, &b).unwrap();
        assert_eq!(merged.len(), 4);
        let mut sorted = merged.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }
}
