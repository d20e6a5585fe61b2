//! Export module for saving heightfields to image files.
//!
//! Supports 16-bit grayscale PNG heightmaps, readable back by the image
//! loader, and RGB normal maps.

mod normal_map;
mod png;

pub use normal_map::{export_normal_map_png, NormalMapError, NormalMapOptions};
pub use png::{export_height_png, PngExportError, PngExportOptions};
