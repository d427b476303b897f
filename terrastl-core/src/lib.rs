/// Terrastl Core Library - scene graph to STL export
///
/// This library provides the exporter that turns a scene graph of meshes
/// into binary or ASCII STL, an STL reader, and the height-field generator
/// that produces terrain meshes to export.

pub mod error;
pub mod geometry;
pub mod scene;
pub mod stl;
pub mod terrain;
pub mod transform;

// Re-export commonly used types
pub use error::{Error, MeshDataError, Result};
pub use geometry::{Facet, MeshData, Skin, Solid, Triangle};
pub use scene::{NodeKind, SceneNode, WorldMesh};
pub use stl::{export_stl, ExportOptions, StlBuffer, StlExport, StlExporter, StlFormat};
pub use terrain::{terrain_scene, HeightField, TerrainConfig, TerrainKind};
pub use transform::{EulerAngles, Transform};
