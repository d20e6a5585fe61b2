//! Normal map export from the mesh vertex normals.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use glam::Vec3;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Rgb};
use thiserror::Error;

use crate::mesh::NormalField;
use crate::terrain::HeightField;

/// Errors that can occur during normal map export.
#[derive(Error, Debug)]
pub enum NormalMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Cannot export an empty heightfield")]
    EmptyField,
}

/// Options for normal map export.
#[derive(Debug, Clone)]
pub struct NormalMapOptions {
    pub compression: CompressionType,
    pub filter: FilterType,
}

impl Default for NormalMapOptions {
    fn default() -> Self {
        Self {
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

fn encode_normal_rgb8(n: Vec3) -> [u8; 3] {
    let c = (n * 0.5) + Vec3::splat(0.5);
    [
        (c.x.clamp(0.0, 1.0) * 255.0) as u8,
        (c.y.clamp(0.0, 1.0) * 255.0) as u8,
        (c.z.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

/// Exports the field's vertex normals as an RGB PNG.
///
/// World normals (Y up) are written tangent-space style: red is +X, green is
/// +Z (up the image) and blue is +Y, so a flat field is `(127, 127, 255)`.
/// Rows are flipped like [`export_height_png`](super::export_height_png).
pub fn export_normal_map_png(
    field: &HeightField,
    path: &Path,
    options: &NormalMapOptions,
) -> Result<(), NormalMapError> {
    if field.is_empty() {
        return Err(NormalMapError::EmptyField);
    }

    let normals = NormalField::from_height_field(field);
    let width = field.columns() as u32;
    let height = field.rows() as u32;

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        let n = normals.get((height - 1 - y) as usize, x as usize);
        Rgb(encode_normal_rgb8(Vec3::new(n.x, n.z, n.y)))
    });

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);
    encoder.write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)?;
    Ok(())
}
