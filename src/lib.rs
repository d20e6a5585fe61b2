//! Heightfield terrain generation, meshing and droplet erosion.
//!
//! A terrain is a [`HeightField`] filled either by random hill accumulation
//! or from a grayscale image. It is meshed into interleaved vertex buffers and
//! primitive-restart triangle strips, and can be sculpted in place by a
//! particle-based hydraulic erosion simulation.

pub mod erosion;
pub mod export;
pub mod mesh;
pub mod pipeline;
pub mod terrain;

pub use erosion::{ErosionConfig, ErosionReport, ErosionSimulator};
pub use mesh::{MeshBuffers, MeshBuilder, NormalField, TerrainRenderer, VertexAttributes};
pub use pipeline::{ErosionStage, GenerationStage, HillStage, ImageStage, Pipeline, StageConfig};
pub use terrain::{HeightField, HillParameters, TerrainContext};
