//! Arena-owned scene graph.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. The graph
//! is assembled once and then only mutated in place: transforms, visibility
//! and material parameters change per frame, the topology never does.
//!
//! Transforms follow the usual retained-mode convention: Euler angles in
//! `XYZ` order, composed as `T · R · S`, parent before child.

use glam::{DMat3, DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{OrreryError, OrreryResult};

use super::resources::{GeometryId, MaterialId};

/// Handle of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Transform-only container.
    Group,
    /// Triangle mesh.
    Mesh {
        geometry: GeometryId,
        material: MaterialId,
    },
    /// Connected line strip.
    Line {
        geometry: GeometryId,
        material: MaterialId,
    },
    /// Point sprites.
    Points {
        geometry: GeometryId,
        material: MaterialId,
    },
    /// Camera-facing quad.
    Sprite { material: MaterialId },
    /// Extruded label.
    Text {
        geometry: GeometryId,
        material: MaterialId,
    },
    /// Omnidirectional light with a falloff range.
    PointLight {
        color: Color,
        intensity: f64,
        range: f64,
    },
    /// Uniform fill light.
    AmbientLight { color: Color, intensity: f64 },
}

impl NodeKind {
    /// Geometry referenced by this node, if any.
    #[must_use]
    pub const fn geometry(&self) -> Option<GeometryId> {
        match self {
            Self::Mesh { geometry, .. }
            | Self::Line { geometry, .. }
            | Self::Points { geometry, .. }
            | Self::Text { geometry, .. } => Some(*geometry),
            _ => None,
        }
    }

    /// Material referenced by this node, if any.
    #[must_use]
    pub const fn material(&self) -> Option<MaterialId> {
        match self {
            Self::Mesh { material, .. }
            | Self::Line { material, .. }
            | Self::Points { material, .. }
            | Self::Sprite { material }
            | Self::Text { material, .. } => Some(*material),
            _ => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh { .. } => "mesh",
            Self::Line { .. } => "line",
            Self::Points { .. } => "points",
            Self::Sprite { .. } => "sprite",
            Self::Text { .. } => "text",
            Self::PointLight { .. } => "point_light",
            Self::AmbientLight { .. } => "ambient_light",
        }
    }
}

/// Local transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    /// Euler angles (radians), `XYZ` order.
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DVec3::ZERO,
        scale: DVec3::ONE,
    };

    /// Identity transform moved to `position`.
    #[must_use]
    pub const fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn quaternion(&self) -> DQuat {
        DQuat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local matrix `T · R · S`.
    #[must_use]
    pub fn matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.position)
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One node of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visible: bool,
    /// Re-oriented toward the camera every frame.
    pub billboard: bool,
}

/// Exponential-squared distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub density: f64,
}

impl Fog {
    /// Fraction of the fog colour mixed in at `distance`.
    #[must_use]
    pub fn factor(&self, distance: f64) -> f64 {
        let d = self.density * distance;
        (1.0 - (-d * d).exp()).clamp(0.0, 1.0)
    }
}

/// The arena.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    fog: Option<Fog>,
}

impl SceneGraph {
    /// Create a graph holding only the root group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "scene".to_string(),
                kind: NodeKind::Group,
                transform: Transform::IDENTITY,
                parent: None,
                children: Vec::new(),
                visible: true,
                billboard: false,
            }],
            fog: None,
        }
    }

    /// The root group.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Attach a new node under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] if `parent` is not in this graph.
    pub fn add(&mut self, parent: NodeId, name: impl Into<String>, kind: NodeKind) -> OrreryResult<NodeId> {
        self.add_with(parent, name, kind, Transform::IDENTITY)
    }

    /// Attach a new node with an initial transform.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] if `parent` is not in this graph.
    pub fn add_with(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> OrreryResult<NodeId> {
        let id = NodeId(self.nodes.len());
        self.node_mut(parent)?.children.push(id);
        self.nodes.push(Node {
            name: name.into(),
            kind,
            transform,
            parent: Some(parent),
            children: Vec::new(),
            visible: true,
            billboard: false,
        });
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn node(&self, id: NodeId) -> OrreryResult<&Node> {
        self.nodes.get(id.0).ok_or(OrreryError::UnknownHandle {
            kind: "node",
            index: id.0,
        })
    }

    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn node_mut(&mut self, id: NodeId) -> OrreryResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(OrreryError::UnknownHandle {
            kind: "node",
            index: id.0,
        })
    }

    /// Mutable local transform of a node.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn transform_mut(&mut self, id: NodeId) -> OrreryResult<&mut Transform> {
        Ok(&mut self.node_mut(id)?.transform)
    }

    /// Every node with its handle, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// First node with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// All nodes below `id`, depth first, excluding `id` itself.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn descendants(&self, id: NodeId) -> OrreryResult<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id)?.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next)?.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Model matrix of a node in scene space.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn world_matrix(&self, id: NodeId) -> OrreryResult<DMat4> {
        let node = self.node(id)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Ok(self.world_matrix(parent)? * local),
            None => Ok(local),
        }
    }

    /// Scene-space origin of a node.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn world_position(&self, id: NodeId) -> OrreryResult<DVec3> {
        Ok(self.world_matrix(id)?.transform_point3(DVec3::ZERO))
    }

    /// Whether a node and all its ancestors are visible.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(current.0) {
                Some(node) if node.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Rotate a node so its local `+z` axis points at a scene-space target.
    ///
    /// Parent rotation is compensated; parent scale is not. A target at the
    /// node's own origin leaves the rotation untouched.
    ///
    /// # Errors
    ///
    /// Returns [`OrreryError::UnknownHandle`] for a foreign handle.
    pub fn look_at(&mut self, id: NodeId, target: DVec3) -> OrreryResult<()> {
        let eye = self.world_position(id)?;
        let forward = target - eye;
        if forward.length_squared() < 1e-18 {
            return Ok(());
        }
        let z = forward.normalize();
        let mut x = DVec3::Y.cross(z);
        if x.length_squared() < 1e-12 {
            // Looking straight along the up axis.
            x = DVec3::X;
        }
        let x = x.normalize();
        let y = z.cross(x);
        let world_rotation = DQuat::from_mat3(&DMat3::from_cols(x, y, z));

        let parent_rotation = match self.node(id)?.parent {
            Some(parent) => self.world_matrix(parent)?.to_scale_rotation_translation().1,
            None => DQuat::IDENTITY,
        };
        let local = parent_rotation.inverse() * world_rotation;
        let (ex, ey, ez) = local.to_euler(EulerRot::XYZ);
        self.node_mut(id)?.transform.rotation = DVec3::new(ex, ey, ez);
        Ok(())
    }

    /// Scene fog, if any.
    #[must_use]
    pub const fn fog(&self) -> Option<Fog> {
        self.fog
    }

    pub fn set_fog(&mut self, fog: Option<Fog>) {
        self.fog = fog;
    }

    /// Detach and drop every node but the root.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        if let Some(root) = self.nodes.first_mut() {
            root.children.clear();
        }
        self.fog = None;
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn test_new_graph_has_root() {
        let g = SceneGraph::new();
        assert_eq!(g.len(), 1);
        assert!(g.is_empty());
        assert_eq!(g.root().index(), 0);
        assert_eq!(g.find("scene"), Some(g.root()));
    }

    #[test]
    fn test_add_links_parent_and_child() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let a = g.add(root, "a", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));
        let b = g.add(a, "b", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));

        assert_eq!(g.node(b).map(|n| n.parent).ok(), Some(Some(a)));
        assert_eq!(g.node(a).map(|n| n.children.clone()).ok(), Some(vec![b]));
        assert_eq!(g.descendants(root).ok(), Some(vec![a, b]));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut g = SceneGraph::new();
        let err = g.add(NodeId(99), "orphan", NodeKind::Group);
        assert!(matches!(err, Err(OrreryError::UnknownHandle { kind: "node", index: 99 })));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_world_matrix_composes_parent_scale() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let axis = g.add(root, "axis", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));
        if let Ok(t) = g.transform_mut(axis) {
            t.scale.z = 6.0;
        }
        let child = g
            .add_with(axis, "marker", NodeKind::Group, Transform::at(DVec3::new(1.0, 2.0, 10.0)))
            .unwrap_or_else(|e| unreachable!("{e}"));

        let p = g.world_position(child).unwrap_or_default();
        assert!(approx(p, DVec3::new(1.0, 2.0, 60.0)), "{p}");
    }

    #[test]
    fn test_rotation_order_xyz() {
        let t = Transform {
            rotation: DVec3::new(0.0, 0.0, FRAC_PI_2),
            ..Transform::IDENTITY
        };
        let v = t.matrix().transform_vector3(DVec3::X);
        assert!(approx(v, DVec3::Y), "{v}");
    }

    #[test]
    fn test_visibility_inherits() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let a = g.add(root, "a", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));
        let b = g.add(a, "b", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));
        assert!(g.is_visible(b));
        if let Ok(n) = g.node_mut(a) {
            n.visible = false;
        }
        assert!(!g.is_visible(b));
        assert!(!g.is_visible(NodeId(42)));
    }

    #[test]
    fn test_look_at_points_plus_z_at_target() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let parent = g
            .add_with(root, "p", NodeKind::Group, Transform {
                rotation: DVec3::new(0.0, 0.7, 0.0),
                ..Transform::IDENTITY
            })
            .unwrap_or_else(|e| unreachable!("{e}"));
        let label = g
            .add_with(parent, "label", NodeKind::Group, Transform::at(DVec3::new(5.0, 0.0, 0.0)))
            .unwrap_or_else(|e| unreachable!("{e}"));

        let target = DVec3::new(-40.0, 25.0, 100.0);
        assert!(g.look_at(label, target).is_ok());

        let world = g.world_matrix(label).unwrap_or_default();
        let eye = world.transform_point3(DVec3::ZERO);
        let facing = world.transform_vector3(DVec3::Z).normalize();
        assert!(approx(facing, (target - eye).normalize()), "{facing}");
    }

    #[test]
    fn test_look_at_self_is_noop() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let n = g.add(root, "n", NodeKind::Group).unwrap_or_else(|e| unreachable!("{e}"));
        assert!(g.look_at(n, DVec3::ZERO).is_ok());
        assert_eq!(g.node(n).map(|n| n.transform).ok(), Some(Transform::IDENTITY));
    }

    #[test]
    fn test_fog_factor() {
        let fog = Fog {
            color: Color::FOG,
            density: 0.0006,
        };
        assert!(fog.factor(0.0).abs() < EPS);
        assert!(fog.factor(1000.0) > 0.3);
        assert!(fog.factor(1e6) > 0.999);
    }

    #[test]
    fn test_clear_keeps_root() {
        let mut g = SceneGraph::new();
        let root = g.root();
        let _ = g.add(root, "a", NodeKind::Group);
        g.set_fog(Some(Fog {
            color: Color::FOG,
            density: 0.1,
        }));
        g.clear();
        assert_eq!(g.len(), 1);
        assert!(g.fog().is_none());
        assert!(g.node(root).map(|n| n.children.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_node_kind_handles() {
        let kind = NodeKind::Sprite {
            material: MaterialId::from_index(3),
        };
        assert_eq!(kind.material().map(MaterialId::index), Some(3));
        assert!(kind.geometry().is_none());
        assert_eq!(kind.label(), "sprite");
    }
}
