use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::error::ExportError;
use crate::core::role::BodyType;

/// Version of the exported JSON layout.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Root of an export: every processed level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub levels: Vec<Level>,
}

impl ExportDocument {
    pub fn new(levels: Vec<Level>) -> Self {
        Self { version: FORMAT_VERSION.to_string(), levels }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string(self).map_err(ExportError::Serialize)
    }

    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(ExportError::Serialize)
    }

    /// Parse a previously exported document.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(ExportError::Document)
    }

    pub fn level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }
}

/// One LevelBlock, in physics units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub game_objects: Vec<GameObject>,
    pub meta: Meta,
}

impl Level {
    /// Multiply every length in the level by `s`.
    pub fn scale(&mut self, s: f64) {
        self.width *= s;
        self.height *= s;
        for object in &mut self.game_objects {
            object.position *= s;
            if let Some(collider) = &mut object.collider {
                collider.scale(s);
            }
        }
    }

    pub fn game_object(&self, name: &str) -> Option<&GameObject> {
        self.game_objects.iter().find(|o| o.name == name)
    }
}

/// A rigid body with at most one (possibly compound) collider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    pub name: String,
    /// Anchor in level physics space.
    pub position: DVec2,
    pub rotation: f64,
    pub body_type: BodyType,
    pub collider: Option<Collider>,
    pub custom_params: BTreeMap<String, String>,
}

/// A collider placed relative to its owner (object anchor or enclosing compound).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub position: DVec2,
    pub rotation: f64,
    #[serde(flatten)]
    pub shape: ColliderShape,
}

/// Collider geometry. Vertex lists are centered on their own centroid and
/// wound clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ColliderShape {
    Cuboid { size: DVec2 },
    Ball { radius: f64 },
    ConvexHull { vertices: Vec<DVec2> },
    Polyline { vertices: Vec<DVec2> },
    Trimesh { vertices: Vec<DVec2>, indices: Vec<[u32; 3]> },
    Compound { children: Vec<Collider> },
}

impl ColliderShape {
    /// Name used for statistics and the JSON `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ColliderShape::Cuboid { .. } => "Cuboid",
            ColliderShape::Ball { .. } => "Ball",
            ColliderShape::ConvexHull { .. } => "ConvexHull",
            ColliderShape::Polyline { .. } => "Polyline",
            ColliderShape::Trimesh { .. } => "Trimesh",
            ColliderShape::Compound { .. } => "Compound",
        }
    }
}

impl Collider {
    pub fn new(position: DVec2, rotation: f64, shape: ColliderShape) -> Self {
        Self { position, rotation, shape }
    }

    pub fn kind(&self) -> &'static str {
        self.shape.kind()
    }

    /// Multiply every length by `s`. Rotations and triangle indices are unchanged.
    pub fn scale(&mut self, s: f64) {
        self.position *= s;
        match &mut self.shape {
            ColliderShape::Cuboid { size } => *size *= s,
            ColliderShape::Ball { radius } => *radius *= s,
            ColliderShape::ConvexHull { vertices }
            | ColliderShape::Polyline { vertices }
            | ColliderShape::Trimesh { vertices, .. } => {
                for v in vertices.iter_mut() {
                    *v *= s;
                }
            }
            ColliderShape::Compound { children } => {
                for child in children.iter_mut() {
                    child.scale(s);
                }
            }
        }
    }

    /// Visit this collider and every nested compound child, pre-order.
    pub fn visit(&self, f: &mut impl FnMut(&Collider)) {
        f(self);
        if let ColliderShape::Compound { children } = &self.shape {
            for child in children {
                child.visit(f);
            }
        }
    }
}

/// Per-level metadata. Every level of a run carries the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub version: String,
    pub timestamp: String,
    pub warnings: Vec<String>,
    pub stats: Stats,
    pub units: Units,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub levels: usize,
    pub game_objects: usize,
    /// Emitted colliders per kind, compound children included.
    pub colliders: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Units {
    pub pixels_per_unit: f64,
}
