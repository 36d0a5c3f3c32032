// core/transform.rs
//
// 2D transform math for the export pipeline.
//
// Spaces, outermost first:
//   world:   authoring space of the host document (top-left origin, Y-down)
//   level:   the same, relative to a LevelBlock's top-left corner
//   physics: level space re-centered on the level middle, Y-up
//   local:   physics space relative to a body or compound frame
//
// Only rigid and uniformly scaled source transforms are modeled. Skew and
// non-uniform scale are not decomposed; geometry under such transforms is
// mapped point-wise, so vertices stay correct while extracted rotations and
// primitive sizes (cuboid, ball) do not.

use glam::{DAffine2, DVec2};
use std::f64::consts::{PI, TAU};

/// Rotate a vector by `angle` radians (counter-clockwise in a Y-up frame).
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    let (sin_r, cos_r) = angle.sin_cos();
    DVec2::new(v.x * cos_r - v.y * sin_r, v.x * sin_r + v.y * cos_r)
}

/// Apply an affine transform to a point.
pub fn apply(m: &DAffine2, p: DVec2) -> DVec2 {
    m.transform_point2(p)
}

/// Rotation angle of an affine transform, taken from its first column.
pub fn rotation_of(m: &DAffine2) -> f64 {
    let x_axis = m.matrix2.x_axis;
    x_axis.y.atan2(x_axis.x)
}

/// Build an affine transform from the host's row-major 2×3 layout
/// `[[a, c, tx], [b, d, ty]]`.
pub fn affine_from_rows(rows: [[f64; 3]; 2]) -> DAffine2 {
    let [[a, c, tx], [b, d, ty]] = rows;
    DAffine2::from_cols(DVec2::new(a, b), DVec2::new(c, d), DVec2::new(tx, ty))
}

/// Wrap an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Coordinate system of one LevelBlock: converts world points and rotations
/// into the level's physics space.
#[derive(Debug, Clone, Copy)]
pub struct LevelSpace {
    world_to_level: DAffine2,
    size: DVec2,
    rotation: f64,
}

impl LevelSpace {
    /// Create a level space from the level container's absolute transform and
    /// its extents. Returns `None` when the transform cannot be inverted.
    pub fn new(level_transform: &DAffine2, width: f64, height: f64) -> Option<Self> {
        let det = level_transform.matrix2.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return None;
        }
        Some(Self {
            world_to_level: level_transform.inverse(),
            size: DVec2::new(width, height),
            rotation: rotation_of(level_transform),
        })
    }

    /// Level extents in authoring units.
    pub fn size(&self) -> DVec2 {
        self.size
    }

    /// World point → level-local point (top-left origin, Y-down).
    pub fn world_to_level(&self, p: DVec2) -> DVec2 {
        self.world_to_level.transform_point2(p)
    }

    /// Level-local point → physics point (center origin, Y-up).
    pub fn level_to_physics(&self, p: DVec2) -> DVec2 {
        DVec2::new(p.x - self.size.x * 0.5, self.size.y * 0.5 - p.y)
    }

    /// World point → physics point.
    pub fn world_to_physics(&self, p: DVec2) -> DVec2 {
        self.level_to_physics(self.world_to_level(p))
    }

    /// Map a slice of world points into physics space.
    pub fn points_to_physics(&self, points: &[DVec2]) -> Vec<DVec2> {
        points.iter().map(|&p| self.world_to_physics(p)).collect()
    }

    /// World rotation (Y-down) → physics rotation (Y-up), relative to the level.
    pub fn rotation_to_physics(&self, world_rotation: f64) -> f64 {
        normalize_angle(-(world_rotation - self.rotation))
    }

    /// Physics rotation of a node with the given absolute transform.
    pub fn node_rotation(&self, node_transform: &DAffine2) -> f64 {
        self.rotation_to_physics(rotation_of(node_transform))
    }
}

/// A placement frame in physics space: a body anchor or a compound center.
///
/// Child geometry is expressed relative to the frame by subtracting the
/// origin and rotating by the negated frame rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Origin in level physics space.
    pub origin: DVec2,
    /// Absolute rotation in level physics space.
    pub rotation: f64,
}

impl Frame {
    pub fn new(origin: DVec2, rotation: f64) -> Self {
        Self { origin, rotation }
    }

    /// Physics point → frame-local point.
    pub fn to_local(&self, p: DVec2) -> DVec2 {
        rotate(p - self.origin, -self.rotation)
    }

    /// Map a slice of physics points into the frame.
    pub fn points_to_local(&self, points: &[DVec2]) -> Vec<DVec2> {
        points.iter().map(|&p| self.to_local(p)).collect()
    }

    /// Absolute physics rotation → rotation relative to this frame.
    pub fn local_rotation(&self, absolute: f64) -> f64 {
        normalize_angle(absolute - self.rotation)
    }
}
