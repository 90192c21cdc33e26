use crate::camera::PerspectiveCamera;
use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::Material;
use glam::{Mat4, Vec3};
use haunted_common::{GeometryHandle, MaterialHandle, NodeId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors from scene graph operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {id:?} is not a {expected}")]
    WrongKind { id: NodeId, expected: &'static str },
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the root node cannot be attached to another node")]
    RootAttach,
    #[error("unknown geometry {0:?}")]
    UnknownGeometry(GeometryHandle),
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialHandle),
}

/// A drawable pairing of shared geometry and material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub cast_shadow: bool,
}

/// What a node is, beyond its transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The scene container itself.
    Root,
    Group,
    Mesh(Mesh),
    Light(Light),
    Camera(PerspectiveCamera),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Group => "group",
            Self::Mesh(_) => "mesh",
            Self::Light(_) => "light",
            Self::Camera(_) => "camera",
        }
    }
}

/// A node in the scene tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The scene container.
///
/// Owns every node, geometry and material. Nodes are stored in a BTreeMap
/// keyed by id; child order is insertion order and is kept in each parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    root: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    geometries: BTreeMap<GeometryHandle, Geometry>,
    materials: BTreeMap<MaterialHandle, Material>,
    next_handle: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene holding only the root container.
    pub fn new() -> Self {
        let root = NodeId::new();
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                name: "scene".into(),
                kind: NodeKind::Root,
                transform: Transform::default(),
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            root,
            nodes,
            geometries: BTreeMap::new(),
            materials: BTreeMap::new(),
            next_handle: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        let handle = GeometryHandle(self.bump_handle());
        self.geometries.insert(handle, geometry);
        handle
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.bump_handle());
        self.materials.insert(handle, material);
        handle
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(&handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn geometries(&self) -> &BTreeMap<GeometryHandle, Geometry> {
        &self.geometries
    }

    pub fn materials(&self) -> &BTreeMap<MaterialHandle, Material> {
        &self.materials
    }

    /// Create a node under `parent` and return its id.
    pub fn insert(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        if let NodeKind::Mesh(mesh) = &kind {
            if !self.geometries.contains_key(&mesh.geometry) {
                return Err(SceneError::UnknownGeometry(mesh.geometry));
            }
            if !self.materials.contains_key(&mesh.material) {
                return Err(SceneError::UnknownMaterial(mesh.material));
            }
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::UnknownNode(parent))?;
        let id = NodeId::new();
        parent_node.children.push(id);
        let name = name.into();
        tracing::debug!("added {} '{}' [{}]", kind.name(), name, id.short());
        self.nodes.insert(
            id,
            Node {
                name,
                kind,
                transform,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    pub fn add_group(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.insert(parent, name, NodeKind::Group, transform)
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        geometry: GeometryHandle,
        material: MaterialHandle,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        let mesh = Mesh {
            geometry,
            material,
            cast_shadow: false,
        };
        self.insert(parent, name, NodeKind::Mesh(mesh), transform)
    }

    /// Move `child` under `parent`, detaching it from its current parent
    /// first. Attaching under the current parent moves it to the end.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if child == self.root {
            return Err(SceneError::RootAttach);
        }
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let old_parent = self
            .nodes
            .get(&child)
            .ok_or(SceneError::UnknownNode(child))?
            .parent;

        // Walk up from the new parent: meeting the child means a cycle.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(SceneError::Cycle { parent, child });
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }

        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn transform(&self, id: NodeId) -> Result<&Transform, SceneError> {
        self.nodes
            .get(&id)
            .map(|n| &n.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform, SceneError> {
        self.nodes
            .get_mut(&id)
            .map(|n| &mut n.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    pub fn light(&self, id: NodeId) -> Result<&Light, SceneError> {
        match &self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))?.kind {
            NodeKind::Light(light) => Ok(light),
            _ => Err(SceneError::WrongKind {
                id,
                expected: "light",
            }),
        }
    }

    pub fn light_mut(&mut self, id: NodeId) -> Result<&mut Light, SceneError> {
        match &mut self
            .nodes
            .get_mut(&id)
            .ok_or(SceneError::UnknownNode(id))?
            .kind
        {
            NodeKind::Light(light) => Ok(light),
            _ => Err(SceneError::WrongKind {
                id,
                expected: "light",
            }),
        }
    }

    pub fn camera(&self, id: NodeId) -> Result<&PerspectiveCamera, SceneError> {
        match &self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))?.kind {
            NodeKind::Camera(camera) => Ok(camera),
            _ => Err(SceneError::WrongKind {
                id,
                expected: "camera",
            }),
        }
    }

    /// Camera projection and node transform, borrowed together so one
    /// caller can update both in a single step.
    pub fn camera_mut(
        &mut self,
        id: NodeId,
    ) -> Result<(&mut PerspectiveCamera, &mut Transform), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        match &mut node.kind {
            NodeKind::Camera(camera) => Ok((camera, &mut node.transform)),
            _ => Err(SceneError::WrongKind {
                id,
                expected: "camera",
            }),
        }
    }

    /// Model-to-world matrix: the product of every ancestor's local matrix.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self
                .nodes
                .get(&current)
                .ok_or(SceneError::UnknownNode(current))?;
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent;
        }
        Ok(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok(self.world_matrix(id)?.transform_point3(Vec3::ZERO))
    }

    /// Depth-first, pre-order walk from the root with each node's world
    /// matrix. Children are visited in insertion order.
    pub fn traverse(&self) -> Vec<(NodeId, &Node, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_matrix)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            let world = parent_matrix * node.transform.matrix();
            out.push((id, node, world));
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        out
    }

    /// Find the first node with the given name (depth-first).
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.traverse()
            .into_iter()
            .find(|(_, node, _)| node.name == name)
            .map(|(id, _, _)| id)
    }

    fn bump_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}
