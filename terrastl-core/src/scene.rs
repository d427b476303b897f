/// Scene graph handed to the exporter by the rendering side.
///
/// Nodes own their children. World matrices are never stored; they are
/// composed while walking the tree, so the exporter can apply its axis
/// correction without touching the caller's nodes.
use nalgebra::{Matrix4, Point3};

use crate::error::MeshDataError;
use crate::geometry::{MeshData, Skin, Triangle};

/// What a node carries besides its transform
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshData),
    SkinnedMesh { mesh: MeshData, skin: Skin },
}

impl NodeKind {
    /// Exportable geometry, if this kind carries any.
    pub fn geometry(&self) -> Option<&MeshData> {
        match self {
            NodeKind::Group => None,
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::SkinnedMesh { mesh, .. } => Some(mesh),
        }
    }

    pub fn skin(&self) -> Option<&Skin> {
        match self {
            NodeKind::SkinnedMesh { skin, .. } => Some(skin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Matrix4<f32>,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Matrix4::identity(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self::new(name, NodeKind::Mesh(mesh))
    }

    pub fn skinned_mesh(name: impl Into<String>, mesh: MeshData, skin: Skin) -> Self {
        Self::new(name, NodeKind::SkinnedMesh { mesh, skin })
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Every geometry-bearing node below (and including) `self`, depth-first
    /// pre-order, with its world matrix. `parent_world` is what `self`'s
    /// parent contributes.
    pub fn world_meshes(&self, parent_world: &Matrix4<f32>) -> Vec<WorldMesh<'_>> {
        let mut out = Vec::new();
        self.collect_world_meshes(parent_world, &mut out);
        out
    }

    fn collect_world_meshes<'a>(&'a self, parent_world: &Matrix4<f32>, out: &mut Vec<WorldMesh<'a>>) {
        let world = parent_world * self.transform;

        if let Some(mesh) = self.kind.geometry() {
            out.push(WorldMesh {
                name: &self.name,
                mesh,
                skin: self.kind.skin(),
                world,
            });
        }

        for child in &self.children {
            child.collect_world_meshes(&world, out);
        }
    }
}

/// A mesh paired with the world matrix its ancestors produce
#[derive(Debug, Clone, Copy)]
pub struct WorldMesh<'a> {
    pub name: &'a str,
    pub mesh: &'a MeshData,
    pub skin: Option<&'a Skin>,
    pub world: Matrix4<f32>,
}

impl WorldMesh<'_> {
    /// Triangle count after checking buffers, indices and skin attributes.
    pub fn validate(&self) -> Result<usize, MeshDataError> {
        let count = self.mesh.validate()?;
        if let Some(skin) = self.skin {
            skin.validate(self.mesh.vertex_count())?;
        }
        Ok(count)
    }

    /// World-space position of vertex `index`.
    pub fn vertex(&self, index: usize) -> Point3<f32> {
        let local = &self.mesh.positions[index];
        let posed = match self.skin {
            Some(skin) => skin.deform(index, local),
            None => *local,
        };
        self.world.transform_point(&posed)
    }

    /// World-space triangle `t`.
    pub fn triangle(&self, t: usize) -> Triangle {
        let [a, b, c] = self.mesh.triangle_indices(t);
        Triangle::new(self.vertex(a), self.vertex(b), self.vertex(c))
    }
}
