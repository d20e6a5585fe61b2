//! Draw entry points handed to the rendering layer.
//!
//! The crate does not talk to a GPU API. A renderer implements
//! [`TerrainRenderer`] and receives the mesh plus the layer uniforms it needs.

use super::builder::MeshBuffers;

/// Texture layers and blend thresholds for multi-layer terrain shading.
///
/// Texture `i` is bound to sampler slot `i`. Each pair of adjacent textures is
/// described by two height levels, so `levels.len() == 2 * (textures - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerUniforms<'a> {
    pub texture_keys: &'a [&'a str],
    pub levels: &'a [f32],
}

impl<'a> LayerUniforms<'a> {
    /// Validates the layer lists, returning `None` for fewer than two textures
    /// or a level count that does not match.
    pub fn new(texture_keys: &'a [&'a str], levels: &'a [f32]) -> Option<Self> {
        if texture_keys.len() < 2 {
            return None;
        }
        if (texture_keys.len() - 1) * 2 != levels.len() {
            return None;
        }
        Some(Self { texture_keys, levels })
    }

    /// Number of levels, as passed to the shader.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// `(sampler slot, texture key)` pairs.
    pub fn sampler_bindings(&self) -> impl Iterator<Item = (u32, &'a str)> + '_ {
        self.texture_keys.iter().enumerate().map(|(i, key)| (i as u32, *key))
    }
}

/// Seam to the external rendering layer.
pub trait TerrainRenderer {
    /// Draws triangle strips with primitive restart enabled at `mesh.restart_index`.
    fn draw_strips(&mut self, mesh: &MeshBuffers);

    /// Draws one point per vertex.
    fn draw_points(&mut self, mesh: &MeshBuffers);

    /// Binds the layer textures and uploads the level uniforms.
    fn bind_layers(&mut self, layers: &LayerUniforms<'_>);
}

impl MeshBuffers {
    /// Draws the terrain. Does nothing for an empty mesh.
    pub fn render<R: TerrainRenderer + ?Sized>(&self, renderer: &mut R) {
        if self.is_empty() {
            return;
        }
        renderer.draw_strips(self);
    }

    /// Draws the vertices as points. Does nothing for an empty mesh.
    pub fn render_points<R: TerrainRenderer + ?Sized>(&self, renderer: &mut R) {
        if self.is_empty() {
            return;
        }
        renderer.draw_points(self);
    }

    /// Binds the texture layers and draws the terrain.
    ///
    /// Fewer than two textures or a level count other than `2 * (textures - 1)`
    /// skips the draw silently. Returns whether anything was drawn.
    pub fn render_multilayered<R: TerrainRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        texture_keys: &[&str],
        levels: &[f32],
    ) -> bool {
        if self.is_empty() {
            return false;
        }
        let Some(layers) = LayerUniforms::new(texture_keys, levels) else {
            log::debug!(
                "skipping multi-layer draw: {} textures, {} levels",
                texture_keys.len(),
                levels.len()
            );
            return false;
        };

        renderer.bind_layers(&layers);
        renderer.draw_strips(self);
        true
    }
}
