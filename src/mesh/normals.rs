//! Per-vertex normals of a heightfield surface.

use glam::Vec3;
use rayon::prelude::*;

use crate::terrain::HeightField;

/// Grid vertex position on the unit-centered XZ plane.
///
/// `x` spans `[-0.5, 0.5]` across columns, `z` across rows, `y` is the sample.
/// A grid that is one sample wide along an axis collapses onto -0.5 there.
pub fn vertex_position(field: &HeightField, row: usize, column: usize) -> Vec3 {
    let factor_row = axis_factor(row, field.rows());
    let factor_column = axis_factor(column, field.columns());
    Vec3::new(-0.5 + factor_column, field.get(row, column), -0.5 + factor_row)
}

#[inline]
fn axis_factor(i: usize, extent: usize) -> f32 {
    if extent > 1 {
        i as f32 / (extent - 1) as f32
    } else {
        0.0
    }
}

/// The two triangle normals of one grid quad.
///
/// For corners `A=(r,c)`, `B=(r,c+1)`, `C=(r+1,c+1)`, `D=(r+1,c)` the quad is
/// split along `BD` into triangles `ABD` and `BCD`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QuadNormals {
    abd: Vec3,
    bcd: Vec3,
}

/// Vertex normals for every sample of a heightfield, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalField {
    rows: usize,
    columns: usize,
    normals: Vec<Vec3>,
}

impl NormalField {
    /// Computes smooth vertex normals from the field's implied surface.
    ///
    /// Each vertex normal is the normalized sum of the face normals of every
    /// triangle that touches it. Border vertices simply have fewer terms.
    /// An interior vertex touches six triangles: `BCD` of the up-left quad,
    /// both of the quads above and to the left, and `ABD` of its own quad.
    pub fn from_height_field(field: &HeightField) -> Self {
        let rows = field.rows();
        let columns = field.columns();
        if field.is_empty() {
            return Self { rows, columns, normals: Vec::new() };
        }

        let quad_rows = rows.saturating_sub(1);
        let quad_columns = columns.saturating_sub(1);

        let quads: Vec<QuadNormals> = (0..quad_rows)
            .into_par_iter()
            .flat_map_iter(|r| {
                (0..quad_columns).map(move |c| {
                    let a = vertex_position(field, r, c);
                    let b = vertex_position(field, r, c + 1);
                    let cc = vertex_position(field, r + 1, c + 1);
                    let d = vertex_position(field, r + 1, c);
                    QuadNormals {
                        abd: (b - a).cross(a - d).normalize(),
                        bcd: (d - cc).cross(cc - b).normalize(),
                    }
                })
            })
            .collect();
        let quad = |r: usize, c: usize| quads[r * quad_columns + c];

        let mut normals = Vec::with_capacity(rows * columns);
        for r in 0..rows {
            for c in 0..columns {
                let first_row = r == 0;
                let first_col = c == 0;
                let last_row = r + 1 == rows;
                let last_col = c + 1 == columns;

                let mut sum = Vec3::ZERO;
                // Quad up-left: this vertex is its C corner.
                if !first_row && !first_col {
                    sum += quad(r - 1, c - 1).bcd;
                }
                // Quad up: this vertex is its D corner.
                if !first_row && !last_col {
                    let q = quad(r - 1, c);
                    sum += q.abd + q.bcd;
                }
                // Quad here: this vertex is its A corner.
                if !last_row && !last_col {
                    sum += quad(r, c).abd;
                }
                // Quad left: this vertex is its B corner.
                if !last_row && !first_col {
                    let q = quad(r, c - 1);
                    sum += q.abd + q.bcd;
                }

                normals.push(sum.try_normalize().unwrap_or(Vec3::Y));
            }
        }

        Self { rows, columns, normals }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Normal at an in-range vertex.
    pub fn get(&self, row: usize, column: usize) -> Vec3 {
        self.normals[row * self.columns + column]
    }

    /// All normals, row-major.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.normals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vertex_positions_span_unit_square() {
        let mut field = HeightField::new(3, 5);
        field.set(2, 4, 0.7);
        assert_vec_close(vertex_position(&field, 0, 0), Vec3::new(-0.5, 0.0, -0.5));
        assert_vec_close(vertex_position(&field, 2, 4), Vec3::new(0.5, 0.7, 0.5));
        assert_vec_close(vertex_position(&field, 1, 2), Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_flat_field_normals_point_up() {
        let field = HeightField::new(6, 4);
        let normals = NormalField::from_height_field(&field);
        assert_eq!(normals.as_slice().len(), 24);
        for n in normals.as_slice() {
            assert_vec_close(*n, Vec3::Y);
        }
    }

    #[test]
    fn test_tilted_plane_normals_are_uniform() {
        // Height rises along +x (columns): y = 0.5 * x + const.
        let mut field = HeightField::new(5, 5);
        for (r, c) in field.cell_coords().collect::<Vec<_>>() {
            field.set(r, c, 0.5 * c as f32 / 4.0);
        }
        let normals = NormalField::from_height_field(&field);
        let expected = Vec3::new(-0.5, 1.0, 0.0).normalize();
        for n in normals.as_slice() {
            assert_vec_close(*n, expected);
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let mut field = HeightField::new(7, 9);
        for (r, c) in field.cell_coords().collect::<Vec<_>>() {
            field.set(r, c, ((r * 31 + c * 17) % 11) as f32 / 11.0);
        }
        let normals = NormalField::from_height_field(&field);
        for n in normals.as_slice() {
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn test_single_row_falls_back_to_up() {
        let field = HeightField::from_vec(1, 4, vec![0.1, 0.9, 0.3, 0.5]).unwrap();
        let normals = NormalField::from_height_field(&field);
        assert!(normals.as_slice().iter().all(|&n| n == Vec3::Y));
    }
}
