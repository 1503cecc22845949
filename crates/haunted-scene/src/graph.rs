//! Scene graph: an arena of nodes with parent links, plus the geometry and
//! material tables the mesh nodes point into.
//!
//! Parents are always inserted before their children, so world transforms
//! resolve in a single forward pass over the arena.

use glam::{EulerRot, Mat4, Quat, Vec3};
use haunted_lighting::{AmbientLight, DirectionalLight, PointLight};

use crate::environment::{FogExp2, Sky};
use crate::geometry::MeshData;
use crate::material::StandardMaterial;

/// Index of a node in its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Index of a geometry in its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(usize);

/// Index of a material in its [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl GeometryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform: translation, XYZ Euler rotation in radians, and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Local matrix: translate * rotate * scale.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A drawable mesh instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshNode {
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// What a node is.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure transform parent.
    Group,
    Mesh(MeshNode),
    PointLight(PointLight),
}

/// One entry in the scene graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// The full scene description.
#[derive(Clone, Debug)]
pub struct Scene {
    nodes: Vec<Node>,
    geometries: Vec<MeshData>,
    materials: Vec<StandardMaterial>,
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub fog: Option<FogExp2>,
    pub sky: Option<Sky>,
}

impl Scene {
    /// An empty scene lit by `ambient` and `sun`.
    pub fn new(ambient: AmbientLight, sun: DirectionalLight) -> Self {
        Self {
            nodes: Vec::new(),
            geometries: Vec::new(),
            materials: Vec::new(),
            ambient,
            sun,
            fog: None,
            sky: None,
        }
    }

    pub fn add_geometry(&mut self, mesh: MeshData) -> GeometryId {
        self.geometries.push(mesh);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Insert a node. `parent` must come from this scene.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> NodeId {
        debug_assert!(parent.is_none_or(|p| p.0 < self.nodes.len()));
        self.nodes.push(Node {
            name: name.into(),
            transform,
            parent,
            kind,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<NodeId>,
    ) -> NodeId {
        self.add_node(name, transform, parent, NodeKind::Group)
    }

    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        parent: Option<NodeId>,
        mesh: MeshNode,
    ) -> NodeId {
        self.add_node(name, transform, parent, NodeKind::Mesh(mesh))
    }

    pub fn add_point_light(
        &mut self,
        name: impl Into<String>,
        position: Vec3,
        parent: Option<NodeId>,
        light: PointLight,
    ) -> NodeId {
        self.add_node(
            name,
            Transform::from_translation(position),
            parent,
            NodeKind::PointLight(light),
        )
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Move a node within its parent's space.
    pub fn set_position(&mut self, id: NodeId, position: Vec3) {
        self.nodes[id.0].transform.translation = position;
    }

    pub fn point_light(&self, id: NodeId) -> Option<&PointLight> {
        match &self.nodes[id.0].kind {
            NodeKind::PointLight(light) => Some(light),
            _ => None,
        }
    }

    pub fn point_light_mut(&mut self, id: NodeId) -> Option<&mut PointLight> {
        match &mut self.nodes[id.0].kind {
            NodeKind::PointLight(light) => Some(light),
            _ => None,
        }
    }

    /// First node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn geometry(&self, id: GeometryId) -> &MeshData {
        &self.geometries[id.0]
    }

    pub fn geometries(&self) -> &[MeshData] {
        &self.geometries
    }

    pub fn material(&self, id: MaterialId) -> &StandardMaterial {
        &self.materials[id.0]
    }

    pub fn materials(&self) -> &[StandardMaterial] {
        &self.materials
    }

    pub fn material_mut(&mut self, id: MaterialId) -> &mut StandardMaterial {
        &mut self.materials[id.0]
    }

    /// World matrix of every node, indexed by node id.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.matrix();
            let matrix = match node.parent {
                Some(parent) => world[parent.0] * local,
                None => local,
            };
            world.push(matrix);
        }
        world
    }

    /// World matrix of a single node.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.world_matrix(id).w_axis.truncate()
    }

    /// Every mesh node with its id.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &MeshNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match &node.kind {
                NodeKind::Mesh(mesh) => Some((NodeId(i), mesh)),
                _ => None,
            })
    }

    /// Every point light paired with its world position.
    pub fn point_lights(&self) -> Vec<(Vec3, &PointLight)> {
        let world = self.world_matrices();
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match &node.kind {
                NodeKind::PointLight(light) => Some((world[i].w_axis.truncate(), light)),
                _ => None,
            })
            .collect()
    }
}
