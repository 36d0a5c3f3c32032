// export/builder.rs
//
// Entity Builder: turns one `GameObject:` node into an exported GameObject.
//
//   Start → ComputeAnchor → BuildCollider(s) → Emit
//
// Any BuildError raised while building the collider tree is contained here:
// the object is still emitted, with `collider: None`, and the error becomes
// a warning.

use glam::DVec2;
use std::collections::BTreeMap;

use crate::api::config::ExportConfig;
use crate::api::error::BuildError;
use crate::core::role::{BodyType, ColliderTag, NodeRole};
use crate::core::scene::{NodeId, SceneNode, SceneTree};
use crate::core::transform::{rotate, Frame, LevelSpace};
use crate::geometry::decompose::decompose;
use crate::geometry::polygon::{bounds, center_on_centroid, ensure_clockwise, is_convex};
use crate::geometry::shapes::{node_contours, node_outline};
use crate::geometry::simplify::{simplify, SimplifyOptions};
use crate::geometry::triangulate::triangulate;

use super::diagnostics::Diagnostics;
use super::document::{Collider, ColliderShape, GameObject};

/// Custom param overriding the simplification epsilon.
pub const PARAM_SIMPLIFY_EPSILON: &str = "simplifyEpsilon";
/// Custom param overriding the simplification vertex budget.
pub const PARAM_SIMPLIFY_MAX_POINTS: &str = "simplifyMaxPoints";

/// Result of building one GameObject: the object plus everything noticed
/// along the way.
#[derive(Debug, Clone)]
pub struct BuiltObject {
    pub object: GameObject,
    pub diagnostics: Diagnostics,
}

/// Builds GameObjects of a single level.
pub struct EntityBuilder<'a> {
    tree: &'a SceneTree,
    space: &'a LevelSpace,
    config: &'a ExportConfig,
}

/// Per-object state threaded through collider construction.
struct ObjectScope<'s> {
    name: &'s str,
    simplify: SimplifyOptions,
    diagnostics: Diagnostics,
}

/// Direct children of a GameObject node, sorted by role.
#[derive(Default)]
struct ObjectParts {
    colliders: Vec<NodeId>,
    body_type: Option<BodyType>,
    custom_params: BTreeMap<String, String>,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(tree: &'a SceneTree, space: &'a LevelSpace, config: &'a ExportConfig) -> Self {
        Self { tree, space, config }
    }

    /// Build the GameObject rooted at `object_id`.
    pub fn build(&self, object_id: NodeId) -> BuiltObject {
        let node = &self.tree[object_id];
        let name = match &node.role {
            NodeRole::GameObject { name } => name.as_str(),
            _ => node.name.as_str(),
        };
        log::debug!("building GameObject '{}'", name);

        let mut diagnostics = Diagnostics::new();
        let parts = self.collect_parts(node, name, &mut diagnostics);
        let simplify = self.simplify_options(name, &parts.custom_params, &mut diagnostics);
        let mut scope = ObjectScope { name, simplify, diagnostics };

        let rotation = self.space.node_rotation(&node.transform);
        let anchor = self.compute_anchor(node, &parts.colliders);
        let frame = Frame::new(anchor, rotation);

        let collider = match self.build_object_collider(&parts.colliders, &frame, &mut scope) {
            Ok(collider) => collider,
            Err(err) => {
                scope.diagnostics.warn(format!("GameObject '{}': {}", name, err));
                None
            }
        };

        let mut diagnostics = scope.diagnostics;
        if let Some(collider) = &collider {
            diagnostics.count_collider(collider);
        }
        diagnostics.count_game_object();

        BuiltObject {
            object: GameObject {
                name: name.to_string(),
                position: anchor,
                rotation,
                body_type: parts.body_type.unwrap_or_default(),
                collider,
                custom_params: parts.custom_params,
            },
            diagnostics,
        }
    }

    fn collect_parts(&self, node: &SceneNode, name: &str, diagnostics: &mut Diagnostics) -> ObjectParts {
        let mut parts = ObjectParts::default();
        for &child_id in node.children() {
            let child = &self.tree[child_id];
            match &child.role {
                NodeRole::Collider(ColliderTag::Unsupported(tag)) => diagnostics.warn(format!(
                    "GameObject '{}': unsupported collider kind '{}' on node '{}'",
                    name, tag, child.name
                )),
                NodeRole::Collider(_) => parts.colliders.push(child_id),
                NodeRole::BodyType(body_type) if parts.body_type.is_none() => {
                    parts.body_type = Some(*body_type);
                }
                NodeRole::UnknownBodyType(tag) if parts.body_type.is_none() => {
                    diagnostics.warn(format!(
                        "GameObject '{}': unknown body type '{}', using Static",
                        name, tag
                    ));
                    parts.body_type = Some(BodyType::Static);
                }
                NodeRole::BodyType(_) | NodeRole::UnknownBodyType(_) => diagnostics.warn(format!(
                    "GameObject '{}': extra body type node '{}' ignored",
                    name, child.name
                )),
                NodeRole::CustomParam { key, value } => {
                    if parts.custom_params.insert(key.clone(), value.clone()).is_some() {
                        diagnostics.warn(format!(
                            "GameObject '{}': custom param '{}' defined more than once; last value wins",
                            name, key
                        ));
                    }
                }
                _ => {}
            }
        }
        parts
    }

    fn simplify_options(
        &self,
        name: &str,
        params: &BTreeMap<String, String>,
        diagnostics: &mut Diagnostics,
    ) -> SimplifyOptions {
        let mut options = self.config.simplify;
        if let Some(raw) = params.get(PARAM_SIMPLIFY_EPSILON) {
            match raw.parse::<f64>() {
                Ok(epsilon) if epsilon.is_finite() && epsilon >= 0.0 => options.epsilon = epsilon,
                _ => diagnostics.warn(format!(
                    "GameObject '{}': invalid {} '{}', using {}",
                    name, PARAM_SIMPLIFY_EPSILON, raw, options.epsilon
                )),
            }
        }
        if let Some(raw) = params.get(PARAM_SIMPLIFY_MAX_POINTS) {
            match raw.parse::<usize>() {
                Ok(max_points) => options.max_points = Some(max_points),
                Err(_) => diagnostics.warn(format!(
                    "GameObject '{}': invalid {} '{}', ignoring it",
                    name, PARAM_SIMPLIFY_MAX_POINTS, raw
                )),
            }
        }
        options
    }

    /// Center of the world-space bounding box of all collider geometry,
    /// or the object's visual center when there is none. In physics space.
    fn compute_anchor(&self, node: &SceneNode, colliders: &[NodeId]) -> DVec2 {
        let mut leaves = Vec::new();
        for &id in colliders {
            self.collect_leaves(id, &mut leaves);
        }

        let mut points = Vec::new();
        for id in leaves {
            // Broken geometry is reported when the collider itself is built.
            if let Ok(contours) = node_contours(&self.tree[id], &self.config.flatten) {
                points.extend(contours.into_iter().flat_map(|c| c.points));
            }
        }

        let world = match bounds(&points) {
            Some((min, max)) => (min + max) * 0.5,
            None => node.visual_center(),
        };
        self.space.world_to_physics(world)
    }

    fn collect_leaves(&self, id: NodeId, leaves: &mut Vec<NodeId>) {
        match self.tree[id].role.collider_tag() {
            Some(ColliderTag::Compound) => {
                for member in self.compound_members(id) {
                    self.collect_leaves(member, leaves);
                }
            }
            Some(ColliderTag::Unsupported(_)) | None => {}
            Some(_) => leaves.push(id),
        }
    }

    /// Collider nodes anywhere beneath a compound, not descending into
    /// other collider nodes.
    fn compound_members(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.find_descendants(id, |n| n.role.is_collider())
    }

    fn build_object_collider(
        &self,
        colliders: &[NodeId],
        frame: &Frame,
        scope: &mut ObjectScope<'_>,
    ) -> Result<Option<Collider>, BuildError> {
        match colliders {
            [] => {
                scope
                    .diagnostics
                    .warn(format!("GameObject '{}' has no collider", scope.name));
                Ok(None)
            }
            [single] => self.build_collider(*single, frame, scope),
            many => {
                let mut children = Vec::with_capacity(many.len());
                for &id in many {
                    if let Some(child) = self.build_collider(id, frame, scope)? {
                        children.push(child);
                    }
                }
                if children.is_empty() {
                    scope.diagnostics.warn(format!(
                        "GameObject '{}': none of its colliders produced geometry",
                        scope.name
                    ));
                    return Ok(None);
                }
                Ok(Some(Collider::new(
                    DVec2::ZERO,
                    0.0,
                    ColliderShape::Compound { children },
                )))
            }
        }
    }

    /// Build the collider for node `id`, placed relative to `parent`.
    fn build_collider(
        &self,
        id: NodeId,
        parent: &Frame,
        scope: &mut ObjectScope<'_>,
    ) -> Result<Option<Collider>, BuildError> {
        let node = &self.tree[id];
        let Some(tag) = node.role.collider_tag() else {
            return Ok(None);
        };
        let rotation = self.space.node_rotation(&node.transform);

        match tag {
            ColliderTag::Cuboid | ColliderTag::Ball => {
                let size = node
                    .size
                    .ok_or_else(|| BuildError::MissingDimensions { node: node.name.clone() })?;
                let center = self.space.world_to_physics(node.visual_center());
                let shape = if *tag == ColliderTag::Cuboid {
                    ColliderShape::Cuboid { size }
                } else {
                    ColliderShape::Ball { radius: (size.x + size.y) / 4.0 }
                };
                Ok(Some(Collider::new(
                    parent.to_local(center),
                    parent.local_rotation(rotation),
                    shape,
                )))
            }
            ColliderTag::Convex
            | ColliderTag::SimplifiedConvex
            | ColliderTag::Trimesh
            | ColliderTag::Polyline => self.build_vertex_collider(node, tag, rotation, parent, scope).map(Some),
            ColliderTag::Compound => self.build_compound(id, rotation, parent, scope),
            ColliderTag::Unsupported(kind) => {
                scope.diagnostics.warn(format!(
                    "GameObject '{}': unsupported collider kind '{}' on node '{}'",
                    scope.name, kind, node.name
                ));
                Ok(None)
            }
        }
    }

    fn build_compound(
        &self,
        id: NodeId,
        rotation: f64,
        parent: &Frame,
        scope: &mut ObjectScope<'_>,
    ) -> Result<Option<Collider>, BuildError> {
        let node = &self.tree[id];
        let center = self.space.world_to_physics(node.visual_center());
        let frame = Frame::new(center, rotation);

        let mut children = Vec::new();
        for member in self.compound_members(id) {
            if let Some(child) = self.build_collider(member, &frame, scope)? {
                children.push(child);
            }
        }
        if children.is_empty() {
            scope.diagnostics.warn(format!(
                "GameObject '{}': compound collider '{}' is empty",
                scope.name, node.name
            ));
            return Ok(None);
        }

        Ok(Some(Collider::new(
            parent.to_local(center),
            parent.local_rotation(rotation),
            ColliderShape::Compound { children },
        )))
    }

    /// Hull, polyline and trimesh colliders: outline → physics space →
    /// parent frame → centered on the centroid and counter-rotated into the
    /// node's own frame.
    fn build_vertex_collider(
        &self,
        node: &SceneNode,
        tag: &ColliderTag,
        rotation: f64,
        parent: &Frame,
        scope: &mut ObjectScope<'_>,
    ) -> Result<Collider, BuildError> {
        let outline = node_outline(node, &self.config.flatten)?;
        let mut local = parent.points_to_local(&self.space.points_to_physics(&outline.points));

        let min_points = if *tag == ColliderTag::Polyline { 2 } else { 3 };
        if local.len() < min_points {
            return Err(BuildError::EmptyGeometry { node: node.name.clone() });
        }
        if *tag == ColliderTag::SimplifiedConvex {
            local = simplify(&local, &scope.simplify);
        }

        let local_rotation = parent.local_rotation(rotation);
        let (offset, centered) = center_on_centroid(&local);
        let vertices: Vec<DVec2> = centered.iter().map(|&v| rotate(v, -local_rotation)).collect();

        let shape = match tag {
            ColliderTag::Polyline => ColliderShape::Polyline { vertices },
            ColliderTag::Trimesh => {
                let vertices = ensure_clockwise(vertices);
                let indices = triangulate(&vertices)
                    .map_err(|_| BuildError::Triangulation { node: node.name.clone() })?
                    .into_iter()
                    .map(|[a, b, c]| [a as u32, b as u32, c as u32])
                    .collect();
                ColliderShape::Trimesh { vertices, indices }
            }
            _ => self.convex_shape(node, ensure_clockwise(vertices), scope),
        };
        Ok(Collider::new(offset, local_rotation, shape))
    }

    /// A single hull when convex, otherwise a compound of convex parts.
    fn convex_shape(&self, node: &SceneNode, vertices: Vec<DVec2>, scope: &mut ObjectScope<'_>) -> ColliderShape {
        if is_convex(&vertices) {
            return ColliderShape::ConvexHull { vertices };
        }
        match decompose(&vertices) {
            Ok(mut parts) if parts.len() == 1 => ColliderShape::ConvexHull {
                vertices: parts.remove(0),
            },
            Ok(parts) => ColliderShape::Compound {
                children: parts
                    .into_iter()
                    .map(|part| {
                        let (center, centered) = center_on_centroid(&part);
                        Collider::new(center, 0.0, ColliderShape::ConvexHull { vertices: centered })
                    })
                    .collect(),
            },
            Err(err) => {
                scope.diagnostics.warn(format!(
                    "GameObject '{}': {} on '{}'; exporting its outline as one hull",
                    scope.name, err, node.name
                ));
                ColliderShape::ConvexHull { vertices }
            }
        }
    }
}
