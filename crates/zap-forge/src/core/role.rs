// core/role.rs
//
// Naming-convention parser. Host node names are the only place the
// stringly-typed convention lives; everything downstream matches on NodeRole.
//
//   LevelBlock:<name>
//   GameObject:<name>
//   Collider:<Kind>[ anything]
//   BodyType:<Kind>
//   CustomParam:<key>:<value>

use serde::{Deserialize, Serialize};
use std::fmt;

pub const LEVEL_PREFIX: &str = "LevelBlock:";
pub const GAME_OBJECT_PREFIX: &str = "GameObject:";
pub const COLLIDER_PREFIX: &str = "Collider:";
pub const BODY_TYPE_PREFIX: &str = "BodyType:";
pub const CUSTOM_PARAM_PREFIX: &str = "CustomParam:";

/// Rigid body kind of an exported GameObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyType {
    #[default]
    Static,
    Dynamic,
    Kinematic,
}

impl BodyType {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "Static" => Some(BodyType::Static),
            "Dynamic" => Some(BodyType::Dynamic),
            "Kinematic" => Some(BodyType::Kinematic),
            _ => None,
        }
    }
}

/// Collider kind requested by a `Collider:<Kind>` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColliderTag {
    Cuboid,
    Ball,
    Convex,
    Trimesh,
    Polyline,
    SimplifiedConvex,
    Compound,
    /// A tag the builder does not know; reported as a warning.
    Unsupported(String),
}

impl ColliderTag {
    fn parse(tag: &str) -> Self {
        match tag {
            "Cuboid" => ColliderTag::Cuboid,
            "Ball" => ColliderTag::Ball,
            "Convex" => ColliderTag::Convex,
            "Trimesh" => ColliderTag::Trimesh,
            "Polyline" => ColliderTag::Polyline,
            "SimplifiedConvex" => ColliderTag::SimplifiedConvex,
            "Compound" => ColliderTag::Compound,
            other => ColliderTag::Unsupported(other.to_string()),
        }
    }
}

impl fmt::Display for ColliderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColliderTag::Cuboid => f.write_str("Cuboid"),
            ColliderTag::Ball => f.write_str("Ball"),
            ColliderTag::Convex => f.write_str("Convex"),
            ColliderTag::Trimesh => f.write_str("Trimesh"),
            ColliderTag::Polyline => f.write_str("Polyline"),
            ColliderTag::SimplifiedConvex => f.write_str("SimplifiedConvex"),
            ColliderTag::Compound => f.write_str("Compound"),
            ColliderTag::Unsupported(tag) => f.write_str(tag),
        }
    }
}

/// Structural role of a scene node, parsed once from its name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeRole {
    Level { name: String },
    GameObject { name: String },
    Collider(ColliderTag),
    BodyType(BodyType),
    /// `BodyType:` with a kind the exporter does not know.
    UnknownBodyType(String),
    CustomParam { key: String, value: String },
    /// Anything else: visual-only content, ignored structurally.
    #[default]
    Other,
}

impl NodeRole {
    /// Classify a node by its name.
    pub fn parse(name: &str) -> Self {
        if let Some(rest) = name.strip_prefix(LEVEL_PREFIX) {
            return NodeRole::Level { name: rest.trim().to_string() };
        }
        if let Some(rest) = name.strip_prefix(GAME_OBJECT_PREFIX) {
            return NodeRole::GameObject { name: rest.trim().to_string() };
        }
        if let Some(rest) = name.strip_prefix(COLLIDER_PREFIX) {
            return NodeRole::Collider(ColliderTag::parse(leading_token(rest)));
        }
        if let Some(rest) = name.strip_prefix(BODY_TYPE_PREFIX) {
            let tag = leading_token(rest);
            return match BodyType::parse(tag) {
                Some(body_type) => NodeRole::BodyType(body_type),
                None => NodeRole::UnknownBodyType(tag.to_string()),
            };
        }
        if let Some(rest) = name.strip_prefix(CUSTOM_PARAM_PREFIX) {
            // Value keeps any further ':' characters.
            let (key, value) = rest.split_once(':').unwrap_or((rest, ""));
            return NodeRole::CustomParam {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            };
        }
        NodeRole::Other
    }

    pub fn is_level(&self) -> bool {
        matches!(self, NodeRole::Level { .. })
    }

    pub fn is_game_object(&self) -> bool {
        matches!(self, NodeRole::GameObject { .. })
    }

    pub fn is_collider(&self) -> bool {
        matches!(self, NodeRole::Collider(_))
    }

    pub fn collider_tag(&self) -> Option<&ColliderTag> {
        match self {
            NodeRole::Collider(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Text up to the first whitespace or ':'.
fn leading_token(rest: &str) -> &str {
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == ':')
        .unwrap_or(rest.len());
    &rest[..end]
}
