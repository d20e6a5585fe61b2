//! Live terrain state: the heightfield, its mesh and the erosion controls.

use std::path::Path;

use glam::Vec3;
use rand_chacha::ChaCha8Rng;

use super::heightfield::HeightField;
use super::hills::{generate_hills_seeded, HillError, HillParameters};
use super::image_loader::{load_height_field, ImageLoadError};
use crate::erosion::{ErosionConfig, ErosionReport, ErosionSimulator};
use crate::mesh::{MeshBuffers, MeshBuilder, VertexAttributes};

/// Default world-space size the terrain is rendered at (width, height scale, depth).
pub const DEFAULT_RENDER_SIZE: Vec3 = Vec3::new(200.0, 50.0, 200.0);

/// Owns one terrain and serializes erosion with mesh rebuilds.
///
/// Erosion always finishes before the mesh is rebuilt, so the buffers handed
/// to the renderer match the heightfield between ticks. Several contexts can
/// live side by side; nothing here is global.
pub struct TerrainContext {
    field: HeightField,
    builder: MeshBuilder,
    mesh: MeshBuffers,
    simulator: ErosionSimulator<ChaCha8Rng>,
    /// Live-tunable erosion parameters.
    pub erosion: ErosionConfig,
    /// Whether [`tick`](Self::tick) runs erosion.
    pub erosion_active: bool,
    /// World-space size used by [`rendered_height_at`](Self::rendered_height_at).
    pub render_size: Vec3,
}

impl TerrainContext {
    /// Wraps an existing heightfield and builds its mesh.
    pub fn new(field: HeightField, attributes: VertexAttributes, seed: u64) -> Self {
        let builder = MeshBuilder::new(attributes);
        let mesh = builder.build(&field);
        Self {
            field,
            builder,
            mesh,
            simulator: ErosionSimulator::seeded(seed),
            erosion: ErosionConfig::default(),
            erosion_active: false,
            render_size: DEFAULT_RENDER_SIZE,
        }
    }

    /// Generates a hill terrain. The seed drives both generation and erosion.
    pub fn from_hills(
        params: &HillParameters,
        attributes: VertexAttributes,
        seed: u64,
    ) -> Result<Self, HillError> {
        let field = generate_hills_seeded(params, seed)?;
        Ok(Self::new(field, attributes, seed.wrapping_add(1)))
    }

    /// Loads a terrain from an image file.
    pub fn from_image(
        path: &Path,
        attributes: VertexAttributes,
        seed: u64,
    ) -> Result<Self, ImageLoadError> {
        let field = load_height_field(path)?;
        Ok(Self::new(field, attributes, seed))
    }

    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    /// Current mesh buffers, in sync with the heightfield.
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    /// Replaces the heightfield and rebuilds the mesh.
    pub fn replace_height_field(&mut self, field: HeightField) {
        self.field = field;
        self.rebuild_mesh();
    }

    /// Regenerates the vertex and index buffers from scratch.
    pub fn rebuild_mesh(&mut self) {
        self.mesh = self.builder.build(&self.field);
    }

    /// Runs `invocations` erosion calls of `erosion.cycles` droplets each,
    /// then rebuilds the mesh once.
    pub fn erode(&mut self, invocations: u32) -> ErosionReport {
        let mut total = ErosionReport::default();
        for _ in 0..invocations {
            total += self.simulator.erode(&mut self.field, self.erosion.cycles, &self.erosion);
        }
        if invocations > 0 {
            self.rebuild_mesh();
        }
        total
    }

    /// Per-frame update: when erosion is active and invocations remain, runs up
    /// to `erosion.steps_per_tick` of them and rebuilds the mesh.
    ///
    /// Returns `None` when nothing ran. Erosion switches itself off once
    /// `erosion.remaining` reaches zero.
    pub fn tick(&mut self) -> Option<ErosionReport> {
        if !self.erosion_active {
            return None;
        }
        let invocations = self.erosion.steps_per_tick.min(self.erosion.remaining);
        if invocations == 0 {
            self.erosion_active = false;
            return None;
        }

        let report = self.erode(invocations);
        self.erosion.remaining -= invocations;
        if self.erosion.remaining == 0 {
            log::debug!("erosion finished");
            self.erosion_active = false;
        }
        Some(report)
    }

    /// Terrain height under a world-space position, scaled to render size.
    pub fn rendered_height_at(&self, position: Vec3) -> f32 {
        self.field.rendered_height_at(self.render_size, position)
    }
}
