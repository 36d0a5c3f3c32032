use glam::DVec2;
use rapier2d::prelude::*;

use crate::core::role::BodyType;
use crate::export::document::{Collider, ColliderShape, GameObject, Level};

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam f64 to nalgebra f32
// ---------------------------------------------------------------------------

fn to_point(v: DVec2) -> Point<Real> {
    point![v.x as Real, v.y as Real]
}

fn to_points(vertices: &[DVec2]) -> Vec<Point<Real>> {
    vertices.iter().map(|&v| to_point(v)).collect()
}

fn to_isometry(position: DVec2, rotation: f64) -> Isometry<Real> {
    Isometry::new(vector![position.x as Real, position.y as Real], rotation as Real)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl BodyType {
    pub fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        }
    }
}

/// Shape of an exported collider, placed relative to its body.
///
/// Compounds are flattened because parry compounds cannot nest. Returns
/// `None` when a hull is degenerate or a compound ends up empty.
pub fn collider_shape(collider: &Collider) -> Option<(Isometry<Real>, SharedShape)> {
    let iso = to_isometry(collider.position, collider.rotation);
    match &collider.shape {
        ColliderShape::Compound { children } => {
            let mut parts = Vec::new();
            for child in children {
                flatten_into(child, &Isometry::identity(), &mut parts)?;
            }
            if parts.is_empty() {
                return None;
            }
            Some((iso, SharedShape::compound(parts)))
        }
        ColliderShape::Trimesh { vertices, indices } => {
            Some((iso, SharedShape::trimesh(to_points(vertices), indices.clone())))
        }
        ColliderShape::Polyline { vertices } => Some((iso, SharedShape::polyline(to_points(vertices), None))),
        _ => Some((iso, primitive_shape(&collider.shape)?)),
    }
}

/// Cuboid, ball and hull shapes.
fn primitive_shape(shape: &ColliderShape) -> Option<SharedShape> {
    match shape {
        ColliderShape::Cuboid { size } => Some(SharedShape::cuboid(
            (size.x * 0.5) as Real,
            (size.y * 0.5) as Real,
        )),
        ColliderShape::Ball { radius } => Some(SharedShape::ball(*radius as Real)),
        ColliderShape::ConvexHull { vertices } => SharedShape::convex_hull(&to_points(vertices)),
        _ => None,
    }
}

/// Append `collider` (and its descendants) to `out`, composing isometries.
/// Trimeshes split into triangles, polylines into segments.
fn flatten_into(
    collider: &Collider,
    parent: &Isometry<Real>,
    out: &mut Vec<(Isometry<Real>, SharedShape)>,
) -> Option<()> {
    let iso = parent * to_isometry(collider.position, collider.rotation);
    match &collider.shape {
        ColliderShape::Compound { children } => {
            for child in children {
                flatten_into(child, &iso, out)?;
            }
        }
        ColliderShape::Trimesh { vertices, indices } => {
            let points = to_points(vertices);
            for [a, b, c] in indices {
                out.push((
                    iso,
                    SharedShape::triangle(points[*a as usize], points[*b as usize], points[*c as usize]),
                ));
            }
        }
        ColliderShape::Polyline { vertices } => {
            let points = to_points(vertices);
            for pair in points.windows(2) {
                out.push((iso, SharedShape::segment(pair[0], pair[1])));
            }
        }
        shape => out.push((iso, primitive_shape(shape)?)),
    }
    Some(())
}

/// Rigid bodies for one exported level, ready to be inserted into a
/// simulation. One body per GameObject that has a usable collider.
pub struct LevelBodies {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    names: Vec<(String, RigidBodyHandle)>,
}

impl LevelBodies {
    pub fn from_level(level: &Level) -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut names = Vec::new();

        for (index, object) in level.game_objects.iter().enumerate() {
            let Some((iso, shape)) = object.collider.as_ref().and_then(collider_shape) else {
                if object.collider.is_some() {
                    log::warn!("GameObject '{}' has a collider rapier cannot represent", object.name);
                }
                continue;
            };
            let handle = bodies.insert(body_for(object, index));
            let collider = ColliderBuilder::new(shape).position(iso).build();
            colliders.insert_with_parent(collider, handle, &mut bodies);
            names.push((object.name.clone(), handle));
        }

        Self { bodies, colliders, names }
    }

    /// Handle of the first body created for the GameObject called `name`.
    pub fn body(&self, name: &str) -> Option<RigidBodyHandle> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handle)| *handle)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The GameObject's index in its level is kept in `user_data`.
fn body_for(object: &GameObject, index: usize) -> RigidBody {
    RigidBodyBuilder::new(object.body_type.to_rapier())
        .translation(vector![object.position.x as Real, object.position.y as Real])
        .rotation(object.rotation as Real)
        .user_data(index as u128)
        .build()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
