/// Scene graph to STL serialization.
///
/// Binary layout:
/// - 80-byte header, all zero
/// - u32 triangle count (little-endian)
/// - per triangle: 3×f32 normal + 3×(3×f32 vertex) + u16 attribute = 50 bytes
///
/// ASCII numbers use `f32`'s `Display`: the shortest decimal that reads back
/// as the same `f32`, without exponent notation.
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::Facet;
use crate::scene::{SceneNode, WorldMesh};
use crate::transform::Transform;

/// Name written after `solid` and `endsolid`
pub const SOLID_NAME: &str = "exported";
pub const HEADER_LEN: usize = 80;
/// Header plus the triangle count field
pub const PREAMBLE_LEN: usize = HEADER_LEN + 4;
pub const FACET_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlFormat {
    #[default]
    Ascii,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: StlFormat,
}

impl ExportOptions {
    pub fn ascii() -> Self {
        Self {
            format: StlFormat::Ascii,
        }
    }

    pub fn binary() -> Self {
        Self {
            format: StlFormat::Binary,
        }
    }
}

/// A finished STL file in memory
#[derive(Debug, Clone, PartialEq)]
pub enum StlBuffer {
    Ascii(String),
    Binary(Vec<u8>),
}

impl StlBuffer {
    pub fn format(&self) -> StlFormat {
        match self {
            StlBuffer::Ascii(_) => StlFormat::Ascii,
            StlBuffer::Binary(_) => StlFormat::Binary,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            StlBuffer::Ascii(text) => text.as_bytes(),
            StlBuffer::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            StlBuffer::Ascii(text) => text.into_bytes(),
            StlBuffer::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// MIME type for download surfaces
    pub fn mime_type(&self) -> &'static str {
        match self {
            StlBuffer::Ascii(_) => "text/plain",
            StlBuffer::Binary(_) => "application/octet-stream",
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}

/// An export result with the counts gathered in the pre-pass
#[derive(Debug, Clone, PartialEq)]
pub struct StlExport {
    pub buffer: StlBuffer,
    pub mesh_count: usize,
    pub triangle_count: usize,
}

impl StlExport {
    /// Turns an export with no triangles into [`Error::EmptyExportTarget`].
    pub fn require_triangles(self) -> Result<Self> {
        if self.triangle_count == 0 {
            return Err(Error::EmptyExportTarget);
        }
        Ok(self)
    }
}

/// Serializes a scene graph into binary or ASCII STL.
///
/// The whole graph is rotated -90° about X first, so the renderer's Y-up
/// frame lands in STL's Z-up frame. The caller's nodes are only read.
#[derive(Debug, Clone, Default)]
pub struct StlExporter {
    options: ExportOptions,
}

impl StlExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn parse(&self, root: &SceneNode) -> Result<StlBuffer> {
        self.export(root).map(|export| export.buffer)
    }

    pub fn export(&self, root: &SceneNode) -> Result<StlExport> {
        let meshes = root.world_meshes(&Transform::axis_correction());
        let (counts, triangle_count) = count_triangles(&meshes)?;

        debug!(
            meshes = meshes.len(),
            triangles = triangle_count,
            format = ?self.options.format,
            "exporting scene to STL"
        );

        let buffer = match self.options.format {
            StlFormat::Binary => {
                let count = u32::try_from(triangle_count)
                    .map_err(|_| Error::TooManyTriangles(triangle_count))?;
                StlBuffer::Binary(write_facets(BinaryStl::new(count), &meshes, &counts))
            }
            StlFormat::Ascii => {
                StlBuffer::Ascii(write_facets(AsciiStl::new(triangle_count), &meshes, &counts))
            }
        };

        Ok(StlExport {
            buffer,
            mesh_count: meshes.len(),
            triangle_count,
        })
    }
}

/// Export `root` with `options`.
pub fn export_stl(root: &SceneNode, options: &ExportOptions) -> Result<StlBuffer> {
    StlExporter::new(*options).parse(root)
}

/// Validates every mesh and returns per-mesh and total triangle counts.
///
/// Runs before any output is produced, so bad data never yields a
/// partially written buffer.
fn count_triangles(meshes: &[WorldMesh<'_>]) -> Result<(Vec<usize>, usize)> {
    let mut counts = Vec::with_capacity(meshes.len());
    let mut total = 0usize;

    for mesh in meshes {
        let count = mesh.validate().map_err(|reason| Error::InvalidMeshData {
            node: mesh.name.to_string(),
            reason,
        })?;
        counts.push(count);
        total += count;
    }

    Ok((counts, total))
}

fn write_facets<S: FacetSink>(mut sink: S, meshes: &[WorldMesh<'_>], counts: &[usize]) -> S::Output {
    let mut written = 0usize;

    for (mesh, &count) in meshes.iter().zip(counts) {
        for t in 0..count {
            sink.write_facet(&mesh.triangle(t).to_facet());
            written += 1;
        }
    }

    debug_assert_eq!(written, counts.iter().sum::<usize>());
    sink.finish()
}

/// Destination for serialized facets. The cursor is the buffer's length.
trait FacetSink {
    type Output;

    fn write_facet(&mut self, facet: &Facet);
    fn finish(self) -> Self::Output;
}

struct BinaryStl {
    buf: Vec<u8>,
}

impl BinaryStl {
    fn new(triangle_count: u32) -> Self {
        let mut buf = Vec::with_capacity(PREAMBLE_LEN + triangle_count as usize * FACET_LEN);
        buf.resize(HEADER_LEN, 0u8);
        buf.extend_from_slice(&triangle_count.to_le_bytes());
        Self { buf }
    }

    fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }
}

impl FacetSink for BinaryStl {
    type Output = Vec<u8>;

    fn write_facet(&mut self, facet: &Facet) {
        self.put_f32(facet.normal.x);
        self.put_f32(facet.normal.y);
        self.put_f32(facet.normal.z);

        for vertex in &facet.vertices {
            self.put_f32(vertex.x);
            self.put_f32(vertex.y);
            self.put_f32(vertex.z);
        }

        // Attribute byte count (unused)
        self.buf.extend_from_slice(&0u16.to_le_bytes());
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct AsciiStl {
    out: String,
}

impl AsciiStl {
    fn new(triangle_count: usize) -> Self {
        let mut out = String::with_capacity(64 + triangle_count * 256);
        out.push_str(&format!("solid {}\n", SOLID_NAME));
        Self { out }
    }
}

impl FacetSink for AsciiStl {
    type Output = String;

    fn write_facet(&mut self, facet: &Facet) {
        let n = &facet.normal;
        self.out
            .push_str(&format!("\tfacet normal {} {} {}\n", n.x, n.y, n.z));
        self.out.push_str("\t\touter loop\n");
        for v in &facet.vertices {
            self.out
                .push_str(&format!("\t\t\tvertex {} {} {}\n", v.x, v.y, v.z));
        }
        self.out.push_str("\t\tendloop\n");
        self.out.push_str("\tendfacet\n");
    }

    fn finish(mut self) -> String {
        self.out.push_str(&format!("endsolid {}\n", SOLID_NAME));
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshDataError;
    use crate::geometry::MeshData;
    use nalgebra::Point3;

    fn triangle_scene() -> SceneNode {
        SceneNode::group("root").with_child(SceneNode::mesh(
            "tri",
            MeshData::new(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ]),
        ))
    }

    #[test]
    fn test_default_format_is_ascii() {
        assert_eq!(ExportOptions::default().format, StlFormat::Ascii);
        let buffer = StlExporter::default().parse(&triangle_scene()).unwrap();
        assert_eq!(buffer.format(), StlFormat::Ascii);
    }

    #[test]
    fn test_ascii_layout() {
        let buffer = export_stl(&triangle_scene(), &ExportOptions::ascii()).unwrap();
        let expected = "solid exported\n\
                        \tfacet normal 0 0 1\n\
                        \t\touter loop\n\
                        \t\t\tvertex 0 0 0\n\
                        \t\t\tvertex 1 0 0\n\
                        \t\t\tvertex 0 1 0\n\
                        \t\tendloop\n\
                        \tendfacet\n\
                        endsolid exported\n";
        assert_eq!(buffer, StlBuffer::Ascii(expected.to_string()));
    }

    #[test]
    fn test_binary_layout() {
        let buffer = export_stl(&triangle_scene(), &ExportOptions::binary()).unwrap();
        let bytes = buffer.as_bytes();

        assert_eq!(bytes.len(), PREAMBLE_LEN + FACET_LEN);
        assert!(bytes[..HEADER_LEN].iter().all(|&b| b == 0));
        assert_eq!(&bytes[80..84], &1u32.to_le_bytes());

        let floats: Vec<f32> = bytes[84..132]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(
            floats,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(&bytes[132..134], &[0, 0]);
    }

    #[test]
    fn test_invalid_mesh_names_node() {
        let root = SceneNode::group("root").with_child(SceneNode::mesh(
            "broken",
            MeshData::indexed(vec![Point3::origin(); 3], vec![0, 1, 7]),
        ));

        let err = export_stl(&root, &ExportOptions::binary()).unwrap_err();
        match err {
            Error::InvalidMeshData { node, reason } => {
                assert_eq!(node, "broken");
                assert_eq!(
                    reason,
                    MeshDataError::IndexOutOfRange {
                        index: 7,
                        vertex_count: 3
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_require_triangles() {
        let export = StlExporter::new(ExportOptions::binary())
            .export(&SceneNode::group("empty"))
            .unwrap();
        assert_eq!(export.triangle_count, 0);
        assert!(matches!(
            export.require_triangles(),
            Err(Error::EmptyExportTarget)
        ));

        let export = StlExporter::default().export(&triangle_scene()).unwrap();
        assert_eq!(export.mesh_count, 1);
        assert!(export.require_triangles().is_ok());
    }

    #[test]
    fn test_buffer_accessors() {
        let buffer = StlBuffer::Ascii("solid exported\nendsolid exported\n".into());
        assert_eq!(buffer.len(), 33);
        assert_eq!(buffer.mime_type(), "text/plain");

        let mut sink = Vec::new();
        buffer.write_to(&mut sink).unwrap();
        assert_eq!(sink, buffer.clone().into_bytes());
    }
}
