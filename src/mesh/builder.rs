//! Vertex and index buffer construction for heightfield meshes.

use serde::{Deserialize, Serialize};

use super::normals::{vertex_position, NormalField};
use crate::terrain::HeightField;

/// Texture coordinates advance this much per grid step (tiles every 10 cells).
pub const TEXTURE_STEP: f32 = 0.1;

const POSITION_FLOATS: usize = 3;
const TEXCOORD_FLOATS: usize = 2;
const NORMAL_FLOATS: usize = 3;

/// Which vertex attributes are written, in buffer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub positions: bool,
    pub texcoords: bool,
    pub normals: bool,
}

impl Default for VertexAttributes {
    fn default() -> Self {
        Self::all()
    }
}

impl VertexAttributes {
    pub const fn all() -> Self {
        Self {
            positions: true,
            texcoords: true,
            normals: true,
        }
    }

    /// Floats per vertex.
    pub fn floats_per_vertex(&self) -> usize {
        let mut n = 0;
        if self.positions {
            n += POSITION_FLOATS;
        }
        if self.texcoords {
            n += TEXCOORD_FLOATS;
        }
        if self.normals {
            n += NORMAL_FLOATS;
        }
        n
    }

    /// Vertex stride in bytes.
    pub fn stride(&self) -> usize {
        self.floats_per_vertex() * std::mem::size_of::<f32>()
    }

    /// Byte offset of the position attribute, if enabled.
    pub fn position_offset(&self) -> Option<usize> {
        self.positions.then_some(0)
    }

    /// Byte offset of the texcoord attribute, if enabled.
    pub fn texcoord_offset(&self) -> Option<usize> {
        let floats = if self.positions { POSITION_FLOATS } else { 0 };
        self.texcoords.then_some(floats * std::mem::size_of::<f32>())
    }

    /// Byte offset of the normal attribute, if enabled.
    pub fn normal_offset(&self) -> Option<usize> {
        let mut floats = 0;
        if self.positions {
            floats += POSITION_FLOATS;
        }
        if self.texcoords {
            floats += TEXCOORD_FLOATS;
        }
        self.normals.then_some(floats * std::mem::size_of::<f32>())
    }
}

/// Number of indices for a `rows x columns` triangle-strip mesh with restarts.
pub fn index_count(rows: usize, columns: usize) -> usize {
    if rows < 2 {
        return 0;
    }
    (rows - 1) * columns * 2 + (rows - 1)
}

/// CPU-side mesh buffers ready for GPU upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers {
    pub attributes: VertexAttributes,
    /// Interleaved vertex data, row-major.
    pub vertices: Vec<f32>,
    /// Triangle-strip indices; [`restart_index`](Self::restart_index) ends each strip.
    pub indices: Vec<u32>,
    /// Primitive-restart sentinel, one past the last vertex.
    pub restart_index: u32,
    pub vertex_count: usize,
}

impl MeshBuffers {
    /// A mesh with no vertices, returned for the empty heightfield.
    pub fn empty(attributes: VertexAttributes) -> Self {
        Self {
            attributes,
            vertices: Vec::new(),
            indices: Vec::new(),
            restart_index: 0,
            vertex_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Vertex data as bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes (`u32`, native endian).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// One vertex's floats.
    pub fn vertex(&self, index: usize) -> &[f32] {
        let n = self.attributes.floats_per_vertex();
        &self.vertices[index * n..(index + 1) * n]
    }
}

/// Builds [`MeshBuffers`] from a heightfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshBuilder {
    pub attributes: VertexAttributes,
}

impl MeshBuilder {
    pub fn new(attributes: VertexAttributes) -> Self {
        Self { attributes }
    }

    /// Builds the full vertex and index buffers.
    ///
    /// The result depends only on the heightfield, so rebuilding an unchanged
    /// field yields identical buffers.
    pub fn build(&self, field: &HeightField) -> MeshBuffers {
        if field.is_empty() {
            return MeshBuffers::empty(self.attributes);
        }

        let rows = field.rows();
        let columns = field.columns();
        let vertex_count = rows * columns;
        let attrs = self.attributes;

        // Every index, and the sentinel one past the last vertex, must fit in u32.
        let Some(restart_index) = restart_index_for(vertex_count) else {
            log::warn!(
                "{}x{} grid exceeds the 32-bit index range, no mesh built",
                rows,
                columns
            );
            return MeshBuffers::empty(attrs);
        };

        let normals = attrs.normals.then(|| NormalField::from_height_field(field));

        let mut vertices = Vec::with_capacity(vertex_count * attrs.floats_per_vertex());
        for r in 0..rows {
            for c in 0..columns {
                if attrs.positions {
                    vertices.extend_from_slice(&vertex_position(field, r, c).to_array());
                }
                if attrs.texcoords {
                    vertices.push(TEXTURE_STEP * c as f32);
                    vertices.push(TEXTURE_STEP * r as f32);
                }
                if let Some(normals) = &normals {
                    vertices.extend_from_slice(&normals.get(r, c).to_array());
                }
            }
        }

        let indices = strip_indices(rows, columns, restart_index);

        log::debug!(
            "built mesh: {} vertices ({} floats each), {} indices",
            vertex_count,
            attrs.floats_per_vertex(),
            indices.len()
        );

        MeshBuffers {
            attributes: attrs,
            vertices,
            indices,
            restart_index,
            vertex_count,
        }
    }
}

/// Restart sentinel for a mesh of `vertex_count` vertices, if it fits in `u32`.
fn restart_index_for(vertex_count: usize) -> Option<u32> {
    u32::try_from(vertex_count).ok()
}

/// Row-pair triangle strips separated by `restart`.
fn strip_indices(rows: usize, columns: usize, restart: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(index_count(rows, columns));
    for r in 0..rows.saturating_sub(1) {
        for c in 0..columns {
            indices.push((r * columns + c) as u32);
            indices.push(((r + 1) * columns + c) as u32);
        }
        indices.push(restart);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{generate_hills_seeded, HillParameters};

    #[test]
    fn test_index_count_formula() {
        for rows in 2..7 {
            for columns in 1..7 {
                let field = HeightField::new(rows, columns);
                let mesh = MeshBuilder::default().build(&field);
                assert_eq!(mesh.indices.len(), (rows - 1) * columns * 2 + (rows - 1));
                assert_eq!(mesh.indices.len(), index_count(rows, columns));
            }
        }
    }

    #[test]
    fn test_strip_layout_with_restart() {
        let field = HeightField::new(3, 2);
        let mesh = MeshBuilder::default().build(&field);
        assert_eq!(mesh.restart_index, 6);
        assert_eq!(mesh.indices, vec![0, 2, 1, 3, 6, 2, 4, 3, 5, 6]);
    }

    #[test]
    fn test_single_row_has_no_indices() {
        let field = HeightField::new(1, 5);
        let mesh = MeshBuilder::default().build(&field);
        assert_eq!(mesh.vertex_count, 5);
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn test_interleaved_vertex_layout() {
        let mut field = HeightField::new(2, 3);
        field.set(1, 2, 0.4);
        let mesh = MeshBuilder::default().build(&field);

        assert_eq!(mesh.attributes.floats_per_vertex(), 8);
        assert_eq!(mesh.vertices.len(), 6 * 8);

        // Last vertex: row 1, column 2.
        let v = mesh.vertex(5);
        assert_eq!(&v[0..3], &[0.5, 0.4, 0.5]);
        assert!((v[3] - 0.2).abs() < 1e-6);
        assert!((v[4] - 0.1).abs() < 1e-6);
        assert!((v[5] * v[5] + v[6] * v[6] + v[7] * v[7] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_attribute_subsets() {
        let field = HeightField::new(4, 4);

        let tex_only = VertexAttributes { positions: false, texcoords: true, normals: false };
        let mesh = MeshBuilder::new(tex_only).build(&field);
        assert_eq!(mesh.vertices.len(), 16 * 2);
        assert_eq!(mesh.vertex(5), &[0.1, 0.1]);

        let normals_only = VertexAttributes { positions: false, texcoords: false, normals: true };
        let mesh = MeshBuilder::new(normals_only).build(&field);
        assert_eq!(mesh.vertices.len(), 16 * 3);
        assert_eq!(mesh.vertex(0), &[0.0, 1.0, 0.0]);
        assert_eq!(normals_only.normal_offset(), Some(0));

        let pos_normals = VertexAttributes { positions: true, texcoords: false, normals: true };
        assert_eq!(pos_normals.stride(), 24);
        assert_eq!(pos_normals.texcoord_offset(), None);
        assert_eq!(pos_normals.normal_offset(), Some(12));
        assert_eq!(VertexAttributes::all().normal_offset(), Some(20));
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = HillParameters::new(40, 30, 25, 2, 9, 0.1, 0.9);
        let field = generate_hills_seeded(&params, 77).unwrap();
        let builder = MeshBuilder::default();

        let a = builder.build(&field);
        let b = builder.build(&field);
        assert_eq!(a.vertex_bytes(), b.vertex_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
    }

    #[test]
    fn test_byte_views() {
        let field = HeightField::new(2, 2);
        let mesh = MeshBuilder::default().build(&field);
        assert_eq!(mesh.vertex_bytes().len(), 4 * 8 * 4);
        assert_eq!(mesh.index_bytes().len(), 5 * 4);
    }

    #[test]
    fn test_empty_field_builds_empty_mesh() {
        let mesh = MeshBuilder::default().build(&HeightField::empty());
        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn test_restart_index_must_fit_u32() {
        assert_eq!(restart_index_for(6), Some(6));
        assert_eq!(restart_index_for(u32::MAX as usize), Some(u32::MAX));
        if let Some(too_many) = (u32::MAX as usize).checked_add(1) {
            assert_eq!(restart_index_for(too_many), None);
        }
    }
}
