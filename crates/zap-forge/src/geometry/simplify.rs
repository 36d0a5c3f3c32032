//! Ramer-Douglas-Peucker simplification for closed outlines, with an
//! optional vertex budget.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::flatten::POINT_EPSILON;
use super::polygon::{distance_to_segment, ensure_clockwise};

/// Minimum number of vertices a simplified outline keeps.
pub const MIN_VERTICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimplifyOptions {
    /// Maximum deviation of a dropped vertex from the kept outline.
    pub epsilon: f64,
    /// Upper bound on the output vertex count (at least 3). `None` = unlimited.
    pub max_points: Option<usize>,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self { epsilon: 1.5, max_points: None }
    }
}

/// Simplify a closed outline. The result has at least 3 vertices (when the
/// input does), honours `max_points`, and is wound clockwise.
pub fn simplify(points: &[DVec2], options: &SimplifyOptions) -> Vec<DVec2> {
    let mut ring = points.to_vec();
    if ring.len() > 1 && ring[0].distance(ring[ring.len() - 1]) < POINT_EPSILON {
        ring.pop();
    }
    if ring.len() <= MIN_VERTICES {
        return ensure_clockwise(ring);
    }

    // Close the loop so the seam between last and first is simplified too.
    ring.push(ring[0]);
    let mut kept = douglas_peucker(&ring, options.epsilon.max(0.0));
    kept.pop();
    ring.pop();

    if kept.len() < MIN_VERTICES {
        kept = ring[..MIN_VERTICES].to_vec();
    }

    if let Some(budget) = options.max_points {
        let budget = budget.max(MIN_VERTICES);
        if kept.len() > budget {
            kept = resample(&kept, budget);
        }
    }

    ensure_clockwise(kept)
}

/// Keep `count` vertices at a uniform index stride.
fn resample(points: &[DVec2], count: usize) -> Vec<DVec2> {
    let n = points.len();
    (0..count).map(|i| points[i * n / count]).collect()
}

/// Iterative RDP over an open chain. Endpoints are always kept.
fn douglas_peucker(points: &[DVec2], epsilon: f64) -> Vec<DVec2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let (split, max_dist) = (first + 1..last)
            .map(|i| (i, distance_to_segment(points[i], a, b)))
            .fold((first, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_dist > epsilon {
            keep[split] = true;
            stack.push((first, split));
            stack.push((split, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}
