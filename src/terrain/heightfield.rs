//! HeightField data structure.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A rectangular grid of elevation samples.
///
/// Samples are stored flat in row-major order: row `r` occupies
/// `heights[r * columns..(r + 1) * columns]`. Freshly generated or loaded
/// data lies in `[0, 1]`; erosion may push values outside that range and
/// nothing renormalizes them.
///
/// The only field with zero rows is the empty sentinel returned by
/// [`HeightField::empty`], which callers are expected to check for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHeightField")]
pub struct HeightField {
    rows: usize,
    columns: usize,
    heights: Vec<f32>,
}

/// Unchecked wire form; deserialization goes through [`HeightField::from_vec`].
#[derive(Deserialize)]
struct RawHeightField {
    rows: usize,
    columns: usize,
    heights: Vec<f32>,
}

impl TryFrom<RawHeightField> for HeightField {
    type Error = String;

    fn try_from(raw: RawHeightField) -> Result<Self, Self::Error> {
        if raw.rows == 0 && raw.columns == 0 && raw.heights.is_empty() {
            return Ok(Self::empty());
        }
        let (rows, columns, len) = (raw.rows, raw.columns, raw.heights.len());
        Self::from_vec(rows, columns, raw.heights)
            .ok_or_else(|| format!("{len} samples do not fill a {rows}x{columns} height field"))
    }
}

impl HeightField {
    /// Creates a zero-initialized field.
    ///
    /// # Panics
    /// Panics if `rows` or `columns` is zero. Use [`HeightField::empty`] for the sentinel.
    pub fn new(rows: usize, columns: usize) -> Self {
        assert!(rows >= 1 && columns >= 1, "height field must be at least 1x1");
        Self {
            rows,
            columns,
            heights: vec![0.0; rows * columns],
        }
    }

    /// Creates a field from row-major samples, or `None` if the length does not match.
    pub fn from_vec(rows: usize, columns: usize, heights: Vec<f32>) -> Option<Self> {
        if rows == 0 || columns == 0 || heights.len() != rows * columns {
            return None;
        }
        Some(Self { rows, columns, heights })
    }

    /// Creates a field from a sequence of equally long rows.
    pub fn from_rows(rows: &[Vec<f32>]) -> Option<Self> {
        let columns = rows.first()?.len();
        if rows.iter().any(|r| r.len() != columns) {
            return None;
        }
        Self::from_vec(rows.len(), columns, rows.concat())
    }

    /// The empty sentinel (zero rows, zero columns).
    pub fn empty() -> Self {
        Self {
            rows: 0,
            columns: 0,
            heights: Vec::new(),
        }
    }

    /// Returns true for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Total number of samples.
    pub fn cell_count(&self) -> usize {
        self.heights.len()
    }

    /// Raw row-major samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.heights
    }

    /// Returns one row of samples.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.heights[row * self.columns..(row + 1) * self.columns]
    }

    /// Returns true if `(row, column)` lies inside the grid.
    pub fn contains(&self, row: isize, column: isize) -> bool {
        row >= 0 && column >= 0 && (row as usize) < self.rows && (column as usize) < self.columns
    }

    /// Bounds-checked height lookup.
    ///
    /// Out-of-range coordinates, including negative ones, yield 0.0.
    pub fn height(&self, row: isize, column: isize) -> f32 {
        if !self.contains(row, column) {
            return 0.0;
        }
        self.heights[row as usize * self.columns + column as usize]
    }

    /// Height at an in-range cell.
    ///
    /// # Panics
    /// Panics if the cell is out of bounds.
    pub fn get(&self, row: usize, column: usize) -> f32 {
        debug_assert!(row < self.rows && column < self.columns);
        self.heights[row * self.columns + column]
    }

    /// Sets the height at an in-range cell.
    ///
    /// # Panics
    /// Panics if the cell is out of bounds.
    pub fn set(&mut self, row: usize, column: usize, value: f32) {
        debug_assert!(row < self.rows && column < self.columns);
        self.heights[row * self.columns + column] = value;
    }

    /// Mutable reference to an in-range cell.
    pub fn get_mut(&mut self, row: usize, column: usize) -> &mut f32 {
        debug_assert!(row < self.rows && column < self.columns);
        &mut self.heights[row * self.columns + column]
    }

    /// Height under a world-space position for a terrain rendered at `render_size`.
    ///
    /// The terrain is centered on the origin and spans `render_size.x` along X and
    /// `render_size.z` along Z. The looked-up sample is scaled by `render_size.y`.
    /// Positions off the terrain read 0.0.
    pub fn rendered_height_at(&self, render_size: Vec3, position: Vec3) -> f32 {
        let half_width = render_size.x / 2.0;
        let half_depth = render_size.z / 2.0;

        let row = (self.rows as f32 * (position.z + half_depth) / render_size.z) as isize;
        let column = (self.columns as f32 * (position.x + half_width) / render_size.x) as isize;

        self.height(row, column) * render_size.y
    }

    /// Returns the minimum height value.
    pub fn min_height(&self) -> f32 {
        self.heights.iter().cloned().fold(f32::MAX, f32::min)
    }

    /// Returns the maximum height value.
    pub fn max_height(&self) -> f32 {
        self.heights.iter().cloned().fold(f32::MIN, f32::max)
    }

    /// Returns (min, max) height range.
    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height(), self.max_height())
    }

    /// Returns an iterator over all (row, column) coordinates in storage order.
    pub fn cell_coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let columns = self.columns;
        (0..self.rows).flat_map(move |r| (0..columns).map(move |c| (r, c)))
    }
}
