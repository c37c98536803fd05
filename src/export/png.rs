//! 16-bit grayscale PNG export of scalar fields.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

use crate::grid::Grid;
use crate::snapshot::Snapshot;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid value range: min ({0}) >= max ({1})")]
    InvalidRange(f32, f32),
    #[error("Field has {got} cells, expected {expected}")]
    FieldSizeMismatch { expected: usize, got: usize },
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Minimum field value for normalization.
    pub min_value: f32,
    /// Maximum field value for normalization.
    pub max_value: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_value: -1.0,
            max_value: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options with the range auto-detected from the field.
    ///
    /// A constant field gets a padded range so normalization stays valid.
    pub fn auto_range(field: &[f32]) -> Self {
        let (mut min, mut max) = Snapshot::field_range(field);
        if min >= max {
            min -= 0.5;
            max += 0.5;
        }
        Self {
            min_value: min,
            max_value: max,
            ..Default::default()
        }
    }
}

/// Exports a scalar field as a 16-bit grayscale PNG.
///
/// Values are normalized into `[min_value, max_value]` and clamped; the
/// darkest pixel is the minimum, the brightest the maximum.
pub fn export_field_png(
    grid: Grid,
    field: &[f32],
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    if field.len() != grid.cells() {
        return Err(PngExportError::FieldSizeMismatch {
            expected: grid.cells(),
            got: field.len(),
        });
    }

    let min = options.min_value;
    let max = options.max_value;
    if min >= max {
        return Err(PngExportError::InvalidRange(min, max));
    }
    let range = max - min;

    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::new(grid.width as u32, grid.height as u32);
    for y in 0..grid.height {
        for x in 0..grid.width {
            let value = field[grid.idx(x, y)];
            let normalized = ((value - min) / range).clamp(0.0, 1.0);
            img.put_pixel(x as u32, y as u32, Luma([(normalized * 65535.0) as u16]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    // The encoder wants bytes; reinterpret the u16 buffer.
    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());
    encoder.write_image(
        byte_slice,
        grid.width as u32,
        grid.height as u32,
        image::ExtendedColorType::L16,
    )?;

    Ok(())
}
