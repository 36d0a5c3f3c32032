use glam::{DAffine2, DVec2};
use serde::Deserialize;
use std::ops::Index;

use crate::api::error::ExportError;
use crate::core::role::NodeRole;
use crate::core::transform::affine_from_rows;

/// Index of a node inside a [`SceneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Host node type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Rectangle,
    Ellipse,
    Frame,
    Group,
    Component,
    Instance,
    Vector,
    BooleanOperation,
    Star,
    Polygon,
    Line,
    Text,
    Other,
}

impl NodeKind {
    /// Parse the host's type string (`"RECTANGLE"`, `"ELLIPSE"`, ...).
    pub fn from_host(kind: &str) -> Self {
        match kind {
            "RECTANGLE" => NodeKind::Rectangle,
            "ELLIPSE" => NodeKind::Ellipse,
            "FRAME" | "SECTION" => NodeKind::Frame,
            "GROUP" => NodeKind::Group,
            "COMPONENT" | "COMPONENT_SET" => NodeKind::Component,
            "INSTANCE" => NodeKind::Instance,
            "VECTOR" => NodeKind::Vector,
            "BOOLEAN_OPERATION" => NodeKind::BooleanOperation,
            "STAR" => NodeKind::Star,
            "POLYGON" | "REGULAR_POLYGON" => NodeKind::Polygon,
            "LINE" => NodeKind::Line,
            "TEXT" => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    /// Kinds whose fallback geometry is their bounding rectangle.
    pub fn is_box_like(self) -> bool {
        matches!(
            self,
            NodeKind::Rectangle
                | NodeKind::Frame
                | NodeKind::Group
                | NodeKind::Component
                | NodeKind::Instance
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Rectangle => "RECTANGLE",
            NodeKind::Ellipse => "ELLIPSE",
            NodeKind::Frame => "FRAME",
            NodeKind::Group => "GROUP",
            NodeKind::Component => "COMPONENT",
            NodeKind::Instance => "INSTANCE",
            NodeKind::Vector => "VECTOR",
            NodeKind::BooleanOperation => "BOOLEAN_OPERATION",
            NodeKind::Star => "STAR",
            NodeKind::Polygon => "POLYGON",
            NodeKind::Line => "LINE",
            NodeKind::Text => "TEXT",
            NodeKind::Other => "OTHER",
        }
    }
}

/// One node of the host scene, owned by the tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Identifier assigned by the host (used for selection lookups).
    pub host_id: String,
    pub name: String,
    /// Parsed once from `name`.
    pub role: NodeRole,
    pub kind: NodeKind,
    /// Width/height in the node's own coordinates, when the host has them.
    pub size: Option<DVec2>,
    /// Node → world transform.
    pub transform: DAffine2,
    /// Path-command strings (`M 0 0 L 10 0 ...`), node-local coordinates.
    pub paths: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            host_id: String::new(),
            role: NodeRole::parse(&name),
            name,
            kind,
            size: None,
            transform: DAffine2::IDENTITY,
            paths: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_host_id(mut self, id: impl Into<String>) -> Self {
        self.host_id = id.into();
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(DVec2::new(width, height));
        self
    }

    pub fn with_transform(mut self, transform: DAffine2) -> Self {
        self.transform = transform;
        self
    }

    /// Place the node's top-left corner at a world position, unrotated.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.transform = DAffine2::from_translation(DVec2::new(x, y));
        self
    }

    pub fn with_path(mut self, data: impl Into<String>) -> Self {
        self.paths.push(data.into());
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World-space center of the node's bounding box.
    pub fn visual_center(&self) -> DVec2 {
        match self.size {
            Some(size) => self.transform.transform_point2(size * 0.5),
            None => self.transform.translation,
        }
    }
}

/// Arena-style owned copy of the host scene graph.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    selection: Vec<NodeId>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node (a page or free-floating container).
    pub fn add_root(&mut self, node: SceneNode) -> NodeId {
        let id = self.push(node, None);
        self.roots.push(id);
        id
    }

    /// Add a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.push(node, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes the user currently has selected in the host, in host order.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Ids that do not belong to this tree are dropped with a warning.
    pub fn set_selection(&mut self, selection: Vec<NodeId>) {
        let len = self.nodes.len();
        self.selection = selection
            .into_iter()
            .filter(|id| {
                let known = id.0 < len;
                if !known {
                    log::warn!("selection id {} is not part of this scene", id.0);
                }
                known
            })
            .collect();
    }

    pub fn find_by_host_id(&self, host_id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.host_id == host_id)
            .map(NodeId)
    }

    /// Pre-order search beneath `start` (excluding `start` itself) for nodes
    /// accepted by `pred`. Matching nodes are not descended into.
    pub fn find_descendants(&self, start: NodeId, pred: impl Fn(&SceneNode) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self[start].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self[id];
            if pred(node) {
                found.push(id);
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        found
    }

    /// Same as [`find_descendants`](Self::find_descendants), over every root.
    pub fn find_in_document(&self, pred: impl Fn(&SceneNode) -> bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        for &root in &self.roots {
            if pred(&self[root]) {
                found.push(root);
            } else {
                found.extend(self.find_descendants(root, &pred));
            }
        }
        found
    }

    /// Parse the host's JSON scene dump.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let raw: RawScene = serde_json::from_str(json).map_err(ExportError::Scene)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawScene) -> Self {
        let mut tree = SceneTree::new();
        for node in raw.nodes {
            let id = tree.add_root(node.to_scene_node());
            tree.add_raw_children(id, node.children);
        }
        let mut selection = Vec::with_capacity(raw.selection.len());
        for host_id in &raw.selection {
            match tree.find_by_host_id(host_id) {
                Some(id) => selection.push(id),
                None => log::warn!("selected node '{}' is not part of the scene dump", host_id),
            }
        }
        tree.selection = selection;
        tree
    }

    fn add_raw_children(&mut self, parent: NodeId, children: Vec<RawNode>) {
        for child in children {
            let id = self.add_child(parent, child.to_scene_node());
            self.add_raw_children(id, child.children);
        }
    }
}

impl Index<NodeId> for SceneTree {
    type Output = SceneNode;

    fn index(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }
}

// ---------------------------------------------------------------------------
// Host JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawScene {
    #[serde(default)]
    selection: Vec<String>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    width: Option<f64>,
    height: Option<f64>,
    absolute_transform: Option<[[f64; 3]; 2]>,
    #[serde(default, alias = "fillGeometry")]
    vector_paths: Vec<RawPath>,
    #[serde(default)]
    children: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPath {
    data: String,
    // Carried by the host; contours are treated as simple boundaries.
    #[serde(default)]
    #[allow(dead_code)]
    winding_rule: Option<String>,
}

impl RawNode {
    fn to_scene_node(&self) -> SceneNode {
        let mut node = SceneNode::new(self.name.clone(), NodeKind::from_host(&self.kind))
            .with_host_id(self.id.clone());
        if let (Some(w), Some(h)) = (self.width, self.height) {
            node.size = Some(DVec2::new(w, h));
        }
        if let Some(rows) = self.absolute_transform {
            node.transform = affine_from_rows(rows);
        }
        node.paths = self.vector_paths.iter().map(|p| p.data.clone()).collect();
        node
    }
}
