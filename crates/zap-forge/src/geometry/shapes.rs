//! World-space outlines of scene nodes.
//!
//! Vector-like nodes are flattened from their path data. Primitive nodes
//! without path data fall back to their box (rectangle, frame, group,
//! component, instance) or to a tolerance-driven ellipse.

use glam::DVec2;
use std::f64::consts::TAU;

use super::flatten::{arc_segment_count, flatten_path, Contour, FlattenOptions};
use crate::api::error::BuildError;
use crate::core::scene::{NodeKind, SceneNode};

/// Minimum number of segments used to approximate a full ellipse.
pub const MIN_ELLIPSE_SEGMENTS: usize = 12;

/// Corners of a `size` box with its top-left at the origin.
pub fn rectangle_corners(size: DVec2) -> Vec<DVec2> {
    vec![
        DVec2::ZERO,
        DVec2::new(size.x, 0.0),
        size,
        DVec2::new(0.0, size.y),
    ]
}

/// Polygon approximating the ellipse inscribed in a `size` box whose
/// top-left is at the origin.
pub fn ellipse_points(size: DVec2, tolerance: f64) -> Vec<DVec2> {
    let radii = size * 0.5;
    let segments = arc_segment_count(radii.max_element(), TAU, tolerance, MIN_ELLIPSE_SEGMENTS);
    (0..segments)
        .map(|i| {
            let (sin_t, cos_t) = (i as f64 / segments as f64 * TAU).sin_cos();
            radii + DVec2::new(radii.x * cos_t, radii.y * sin_t)
        })
        .collect()
}

/// Every contour of `node`, in world space.
pub fn node_contours(node: &SceneNode, options: &FlattenOptions) -> Result<Vec<Contour>, BuildError> {
    let local = if !node.paths.is_empty() {
        let mut contours = Vec::new();
        for data in &node.paths {
            let flattened = flatten_path(data, options).map_err(|source| BuildError::Path {
                node: node.name.clone(),
                source,
            })?;
            contours.extend(flattened);
        }
        contours
    } else if node.kind.is_box_like() || node.kind == NodeKind::Ellipse {
        let size = node
            .size
            .ok_or_else(|| BuildError::MissingDimensions { node: node.name.clone() })?;
        let points = if node.kind == NodeKind::Ellipse {
            ellipse_points(size, options.arc_tolerance)
        } else {
            rectangle_corners(size)
        };
        vec![Contour::new(points, true)]
    } else {
        return Err(BuildError::UnsupportedGeometry {
            node: node.name.clone(),
            kind: node.kind.as_str().to_string(),
        });
    };

    Ok(local
        .into_iter()
        .map(|contour| Contour {
            points: contour
                .points
                .iter()
                .map(|&p| node.transform.transform_point2(p))
                .collect(),
            closed: contour.closed,
        })
        .collect())
}

/// Pick the contour that best represents a node: the closed contour with
/// the largest bounding box, otherwise the longest open one.
pub fn select_contour(contours: Vec<Contour>) -> Option<Contour> {
    let (closed, open): (Vec<Contour>, Vec<Contour>) = contours
        .into_iter()
        .filter(|c| c.len() >= 2)
        .partition(|c| c.closed && c.len() >= 3);

    if !closed.is_empty() {
        return closed
            .into_iter()
            .max_by(|a, b| a.bounds_area().total_cmp(&b.bounds_area()));
    }
    open.into_iter()
        .max_by(|a, b| a.length().total_cmp(&b.length()))
}

/// The representative world-space outline of `node`.
pub fn node_outline(node: &SceneNode, options: &FlattenOptions) -> Result<Contour, BuildError> {
    select_contour(node_contours(node, options)?)
        .ok_or_else(|| BuildError::EmptyGeometry { node: node.name.clone() })
}
