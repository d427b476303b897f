/// Geometry primitives: mesh buffers, triangles and STL facets
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::MeshDataError;

/// A triangle given by three positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Face normal as `normalize((C - B) x (A - B))`.
    ///
    /// Only a cross product of exactly zero length (collinear or coincident
    /// vertices) yields the zero vector. Tiny triangles still get a unit
    /// normal: the cross product is rescaled by its largest component before
    /// normalizing so its squared length cannot underflow.
    pub fn face_normal(&self) -> Vector3<f32> {
        let [a, b, c] = self.vertices;
        let cross = (c - b).cross(&(a - b));

        let largest = cross.amax();
        if !(largest > 0.0 && largest.is_finite()) {
            return Vector3::zeros();
        }
        (cross / largest).normalize()
    }

    pub fn to_facet(&self) -> Facet {
        Facet {
            normal: self.face_normal(),
            vertices: self.vertices,
        }
    }
}

/// One STL record: a stored normal followed by three vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
}

/// A list of facets, as read back from an STL file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    pub name: Option<String>,
    pub facets: Vec<Facet>,
}

impl Solid {
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

/// Vertex positions plus an optional triangle index buffer.
///
/// Without indices, positions are consumed three at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Point3<f32>>,
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    pub fn new(positions: Vec<Point3<f32>>) -> Self {
        Self {
            positions,
            indices: None,
        }
    }

    pub fn indexed(positions: Vec<Point3<f32>>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles the buffers describe.
    ///
    /// Fails when the relevant count is not a multiple of 3; the exporter
    /// never triangulates.
    pub fn triangle_count(&self) -> Result<usize, MeshDataError> {
        match &self.indices {
            Some(indices) if indices.len() % 3 != 0 => {
                Err(MeshDataError::IndexCountNotTriangulated(indices.len()))
            }
            Some(indices) => Ok(indices.len() / 3),
            None if self.positions.len() % 3 != 0 => Err(
                MeshDataError::VertexCountNotTriangulated(self.positions.len()),
            ),
            None => Ok(self.positions.len() / 3),
        }
    }

    /// Checks the triangle count and every index against the vertex count.
    pub fn validate(&self) -> Result<usize, MeshDataError> {
        let count = self.triangle_count()?;

        if let Some(indices) = &self.indices {
            let vertex_count = self.positions.len();
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshDataError::IndexOutOfRange {
                    index,
                    vertex_count,
                });
            }
        }

        Ok(count)
    }

    /// Vertex indices of triangle `t`. Callers validate first.
    pub fn triangle_indices(&self, t: usize) -> [usize; 3] {
        match &self.indices {
            Some(indices) => [
                indices[t * 3] as usize,
                indices[t * 3 + 1] as usize,
                indices[t * 3 + 2] as usize,
            ],
            None => [t * 3, t * 3 + 1, t * 3 + 2],
        }
    }

    /// Axis-aligned cube centred on the origin, 8 shared vertices and
    /// counter-clockwise faces seen from outside.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let positions = vec![
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];

        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // front (+z)
            1, 0, 3, 1, 3, 2, // back (-z)
            3, 7, 6, 3, 6, 2, // top (+y)
            0, 1, 5, 0, 5, 4, // bottom (-y)
            1, 2, 6, 1, 6, 5, // right (+x)
            0, 4, 7, 0, 7, 3, // left (-x)
        ];

        Self::indexed(positions, indices)
    }
}

/// Linear blend skinning data attached to a skinned mesh.
///
/// `bone_matrices[i]` is bone `i`'s world matrix multiplied by its inverse
/// bind matrix, already evaluated for the pose being exported.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    bind_matrix: Matrix4<f32>,
    bind_matrix_inverse: Matrix4<f32>,
    pub bone_matrices: Vec<Matrix4<f32>>,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
}

impl Skin {
    pub fn new(
        bind_matrix: Matrix4<f32>,
        bone_matrices: Vec<Matrix4<f32>>,
        joints: Vec<[u16; 4]>,
        weights: Vec<[f32; 4]>,
    ) -> Result<Self, MeshDataError> {
        let bind_matrix_inverse = bind_matrix
            .try_inverse()
            .ok_or(MeshDataError::SingularBindMatrix)?;

        Ok(Self {
            bind_matrix,
            bind_matrix_inverse,
            bone_matrices,
            joints,
            weights,
        })
    }

    /// Checks attribute lengths against the mesh and joints against the bones.
    pub fn validate(&self, vertex_count: usize) -> Result<(), MeshDataError> {
        if self.joints.len() != vertex_count {
            return Err(MeshDataError::SkinAttributeLength {
                attribute: "joint",
                expected: vertex_count,
                found: self.joints.len(),
            });
        }
        if self.weights.len() != vertex_count {
            return Err(MeshDataError::SkinAttributeLength {
                attribute: "weight",
                expected: vertex_count,
                found: self.weights.len(),
            });
        }

        let bone_count = self.bone_matrices.len();
        for (joints, weights) in self.joints.iter().zip(&self.weights) {
            for (&joint, &weight) in joints.iter().zip(weights) {
                // unweighted slots may carry any joint value
                if weight != 0.0 && joint as usize >= bone_count {
                    return Err(MeshDataError::JointOutOfRange { joint, bone_count });
                }
            }
        }

        Ok(())
    }

    /// Deforms vertex `index` at `position` into the posed mesh's local space.
    pub fn deform(&self, index: usize, position: &Point3<f32>) -> Point3<f32> {
        let bound = self.bind_matrix.transform_point(position);
        let mut skinned = Vector3::zeros();

        for (&joint, &weight) in self.joints[index].iter().zip(&self.weights[index]) {
            if weight == 0.0 {
                continue;
            }
            let bone = &self.bone_matrices[joint as usize];
            skinned += bone.transform_point(&bound).coords * weight;
        }

        self.bind_matrix_inverse
            .transform_point(&Point3::from(skinned))
    }
}
