/// Error types shared by the exporter, the STL reader and terrain generation
use thiserror::Error;

/// Structural problems in a mesh's buffers.
///
/// These are programmer errors in whoever built the scene; the exporter
/// refuses to write anything when it finds one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshDataError {
    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangulated(usize),

    #[error("vertex count {0} is not a multiple of 3")]
    VertexCountNotTriangulated(usize),

    #[error("index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("skin has {found} {attribute} entries but the mesh has {expected} vertices")]
    SkinAttributeLength {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("joint {joint} out of range (bone count = {bone_count})")]
    JointOutOfRange { joint: u16, bone_count: usize },

    #[error("bind matrix is not invertible")]
    SingularBindMatrix,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("rendering context unavailable: {0}")]
    UnsupportedRenderingContext(String),

    #[error("invalid mesh data in `{node}`: {reason}")]
    InvalidMeshData { node: String, reason: MeshDataError },

    #[error("scene contains no exportable triangles")]
    EmptyExportTarget,

    #[error("{0} triangles exceed the binary STL triangle count field")]
    TooManyTriangles(usize),

    #[error("invalid terrain configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse STL: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
