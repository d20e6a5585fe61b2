//! PNG export functionality for heightfields.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

use crate::terrain::HeightField;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Cannot export an empty heightfield")]
    EmptyField,
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Height mapped to black.
    pub min_height: f32,
    /// Height mapped to white.
    pub max_height: f32,
    pub compression: CompressionType,
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options spanning the field's actual height range.
    ///
    /// A perfectly flat field gets a unit-wide range starting at its height.
    pub fn auto_range(field: &HeightField) -> Self {
        let (min, max) = field.height_range();
        let max = if max > min { max } else { min + 1.0 };
        Self {
            min_height: min,
            max_height: max,
            ..Default::default()
        }
    }
}

/// Exports a heightfield as a 16-bit grayscale PNG.
///
/// The last row of the field becomes the top row of the image, mirroring
/// how images are loaded.
pub fn export_height_png(
    field: &HeightField,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    if field.is_empty() {
        return Err(PngExportError::EmptyField);
    }

    let min = options.min_height;
    let max = options.max_height;
    if !(min < max) {
        return Err(PngExportError::InvalidHeightRange(min, max));
    }
    let range = max - min;

    let width = field.columns() as u32;
    let height = field.rows() as u32;
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(width, height, |x, y| {
        let row = (height - 1 - y) as usize;
        let normalized = ((field.get(row, x as usize) - min) / range).clamp(0.0, 1.0);
        Luma([(normalized * 65535.0) as u16])
    });

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());
    encoder.write_image(byte_slice, width, height, image::ExtendedColorType::L16)?;

    log::debug!("wrote {}x{} heightmap to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gradient(rows: usize, columns: usize) -> HeightField {
        let mut field = HeightField::new(rows, columns);
        for (r, c) in field.cell_coords().collect::<Vec<_>>() {
            field.set(r, c, (r + c) as f32 / (rows + columns - 2) as f32);
        }
        field
    }

    #[test]
    fn test_export_height_png() {
        let field = gradient(24, 40);
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");

        export_height_png(&field, &path, &PngExportOptions::default()).unwrap();

        let img = image::open(&path).unwrap().to_luma16();
        assert_eq!(img.dimensions(), (40, 24));
        // Bottom-left pixel is field row 0, column 0.
        assert_eq!(img.get_pixel(0, 23).0[0], 0);
        // Top-right pixel is the highest sample.
        assert_eq!(img.get_pixel(39, 0).0[0], 65535);
    }

    #[test]
    fn test_export_round_trips_through_loader_orientation() {
        let mut field = HeightField::new(3, 2);
        field.set(2, 0, 1.0);
        let dir = tempdir().unwrap();
        let path = dir.path().join("flip.png");

        export_height_png(&field, &path, &PngExportOptions::default()).unwrap();

        let loaded = crate::terrain::load_height_field(&path).unwrap();
        assert_eq!((loaded.rows(), loaded.columns()), (3, 2));
        assert_eq!(loaded.get(2, 0), 1.0);
        assert_eq!(loaded.get(0, 0), 0.0);
    }

    #[test]
    fn test_invalid_height_range() {
        let field = HeightField::new(4, 4);
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");

        let options = PngExportOptions {
            min_height: 1.0,
            max_height: -1.0,
            ..Default::default()
        };

        let result = export_height_png(&field, &path, &options);
        assert!(matches!(result, Err(PngExportError::InvalidHeightRange(_, _))));
    }

    #[test]
    fn test_empty_field_is_rejected() {
        let dir = tempdir().unwrap();
        let result = export_height_png(
            &HeightField::empty(),
            &dir.path().join("empty.png"),
            &PngExportOptions::default(),
        );
        assert!(matches!(result, Err(PngExportError::EmptyField)));
    }

    #[test]
    fn test_auto_range() {
        let mut field = HeightField::new(16, 16);
        field.set(0, 0, -0.5);
        field.set(15, 15, 0.75);

        let options = PngExportOptions::auto_range(&field);
        assert_eq!(options.min_height, -0.5);
        assert_eq!(options.max_height, 0.75);

        let flat = PngExportOptions::auto_range(&HeightField::new(2, 2));
        assert_eq!((flat.min_height, flat.max_height), (0.0, 1.0));
    }
}
