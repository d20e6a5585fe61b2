//! Mesh generation.
//!
//! Turns a [`HeightField`](crate::terrain::HeightField) into interleaved
//! vertex buffers and primitive-restart triangle strips.

mod builder;
mod layers;
mod normals;

pub use builder::{index_count, MeshBuffers, MeshBuilder, VertexAttributes, TEXTURE_STEP};
pub use layers::{LayerUniforms, TerrainRenderer};
pub use normals::{vertex_position, NormalField};
