//! Heightfield loading from grayscale-convertible images.

use std::path::Path;

use image::DynamicImage;
use thiserror::Error;

use super::heightfield::HeightField;

/// Errors that can occur while decoding a heightmap image.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),
}

/// Returns the first channel of every pixel, top row first, 8 bits per channel.
fn first_channel_bytes(img: &DynamicImage) -> Vec<u8> {
    match img {
        DynamicImage::ImageLuma8(buf) => buf.as_raw().clone(),
        // RGBA conversion keeps the first channel in slot 0 for every layout
        // (luma is replicated, wider formats are narrowed to 8 bits).
        other => other.to_rgba8().pixels().map(|p| p.0[0]).collect(),
    }
}

/// Builds a heightfield from a decoded image.
///
/// Only the first channel is used, mapped to `intensity / 255.0`. The image is
/// flipped vertically so row 0 of the field is the bottom row of the picture.
pub fn height_field_from_image(img: &DynamicImage) -> Result<HeightField, ImageLoadError> {
    let width = img.width();
    let height = img.height();
    if width == 0 || height == 0 {
        return Err(ImageLoadError::EmptyImage(width, height));
    }

    let bytes = first_channel_bytes(img);
    let columns = width as usize;
    let rows = height as usize;

    let mut heights = Vec::with_capacity(rows * columns);
    for src_row in bytes.chunks_exact(columns).rev() {
        heights.extend(src_row.iter().map(|&b| b as f32 / 255.0));
    }

    HeightField::from_vec(rows, columns, heights).ok_or(ImageLoadError::EmptyImage(width, height))
}

/// Decodes an image file into a heightfield.
pub fn load_height_field(path: &Path) -> Result<HeightField, ImageLoadError> {
    let img = image::open(path)?;
    let field = height_field_from_image(&img)?;
    log::debug!(
        "loaded {}x{} height field from {}",
        field.rows(),
        field.columns(),
        path.display()
    );
    Ok(field)
}

/// Decodes an image file, returning the empty sentinel on failure.
///
/// Callers must check [`HeightField::is_empty`] before using the result.
pub fn load_height_field_or_empty(path: &Path) -> HeightField {
    match load_height_field(path) {
        Ok(field) => field,
        Err(e) => {
            log::warn!("Failed to load heightmap image {}: {}", path.display(), e);
            HeightField::empty()
        }
    }
}
