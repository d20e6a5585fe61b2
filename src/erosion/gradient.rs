//! Smoothed surface normal estimate used to steer droplets.

use std::f32::consts::SQRT_2;

use glam::Vec3;

use crate::terrain::HeightField;

const WEIGHT_NEXT_ROW: f32 = 0.5;
const WEIGHT_PREV_ROW: f32 = 0.15;
const WEIGHT_NEXT_COLUMN: f32 = 0.25;
const WEIGHT_PREV_COLUMN: f32 = 0.15;
const WEIGHT_DIAGONAL: f32 = 0.1;
/// Weight of the stand-in term for a missing axis neighbor.
const WEIGHT_AXIS_FALLBACK: f32 = 0.15;

/// Normal of the edge towards a row neighbor with height difference `dh`.
#[inline]
fn along_row(scale: f32, dh: f32) -> Vec3 {
    Vec3::new(scale * dh, 1.0, 0.0).normalize()
}

/// Normal of the edge towards a column neighbor with height difference `dh`.
#[inline]
fn along_column(scale: f32, dh: f32) -> Vec3 {
    Vec3::new(0.0, 1.0, scale * dh).normalize()
}

/// Normal of the edge towards a diagonal neighbor with height difference `dh`.
#[inline]
fn along_diagonal(scale: f32, dh: f32) -> Vec3 {
    let d = scale * dh / SQRT_2;
    Vec3::new(d, SQRT_2, d).normalize()
}

/// Weighted sum of per-neighbor edge normals at cell `(row, column)`.
///
/// `x` follows the row axis and `z` the column axis; a droplet's acceleration is
/// `(n.x, n.z)`. Each of the 8 neighbors contributes with a fixed weight. A
/// neighbor outside the grid contributes a flat up vector instead, and weights
/// are not renormalized, so gradients flatten towards the border.
///
/// # Panics
/// Panics if the cell is out of bounds.
pub fn surface_normal(field: &HeightField, row: usize, column: usize, scale: f32) -> Vec3 {
    let h = field.get(row, column);
    let has_prev_row = row > 0;
    let has_next_row = row + 1 < field.rows();
    let has_prev_col = column > 0;
    let has_next_col = column + 1 < field.columns();

    let mut n = Vec3::ZERO;

    n += if has_next_row {
        WEIGHT_NEXT_ROW * along_row(scale, h - field.get(row + 1, column))
    } else {
        WEIGHT_AXIS_FALLBACK * Vec3::Y
    };
    n += if has_prev_row {
        WEIGHT_PREV_ROW * along_row(scale, field.get(row - 1, column) - h)
    } else {
        WEIGHT_AXIS_FALLBACK * Vec3::Y
    };
    n += if has_next_col {
        WEIGHT_NEXT_COLUMN * along_column(scale, h - field.get(row, column + 1))
    } else {
        WEIGHT_AXIS_FALLBACK * Vec3::Y
    };
    n += if has_prev_col {
        WEIGHT_PREV_COLUMN * along_column(scale, field.get(row, column - 1) - h)
    } else {
        WEIGHT_AXIS_FALLBACK * Vec3::Y
    };

    let diagonals = [
        (has_next_row && has_next_col).then(|| (row + 1, column + 1)),
        (has_next_row && has_prev_col).then(|| (row + 1, column - 1)),
        (has_prev_row && has_next_col).then(|| (row - 1, column + 1)),
        (has_prev_row && has_prev_col).then(|| (row - 1, column - 1)),
    ];
    for neighbor in diagonals {
        n += WEIGHT_DIAGONAL
            * match neighbor {
                Some((r, c)) => along_diagonal(scale, h - field.get(r, c)),
                None => Vec3::Y,
            };
    }

    n
}
