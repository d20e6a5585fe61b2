//! Terrain data and sources.
//!
//! Provides the [`HeightField`] grid, the two ways of filling one (random
//! hills and grayscale images) and the [`TerrainContext`] that ties a field
//! to its mesh and erosion state.

mod context;
mod heightfield;
mod hills;
mod image_loader;

pub use context::{TerrainContext, DEFAULT_RENDER_SIZE};
pub use heightfield::HeightField;
pub use hills::{generate_hills, generate_hills_seeded, raise_hill, Hill, HillError, HillParameters};
pub use image_loader::{height_field_from_image, load_height_field, load_height_field_or_empty, ImageLoadError};
