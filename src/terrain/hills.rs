//! Heightfield generation by randomized hill accumulation.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::heightfield::HeightField;
use crate::erosion::ConfigError;

/// Errors for invalid hill parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HillError {
    #[error("Grid must be at least 1x1 (got {0}x{1})")]
    EmptyGrid(usize, usize),
    #[error("Invalid hill radius range: min ({0}) must be >= 1 and <= max ({1})")]
    InvalidRadiusRange(u32, u32),
    #[error("Invalid hill height range: need 0 <= min ({0}) <= max ({1})")]
    InvalidHeightRange(f32, f32),
}

/// Parameters for hill accumulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillParameters {
    pub rows: usize,
    pub columns: usize,
    /// Number of hills to place.
    pub num_hills: u32,
    /// Smallest hill radius in cells (inclusive).
    pub radius_min: u32,
    /// Largest hill radius in cells (inclusive).
    pub radius_max: u32,
    /// Lowest peak height.
    pub height_min: f32,
    /// Highest peak height.
    pub height_max: f32,
}

impl Default for HillParameters {
    fn default() -> Self {
        Self {
            rows: 200,
            columns: 200,
            num_hills: 20,
            radius_min: 10,
            radius_max: 40,
            height_min: 0.2,
            height_max: 0.8,
        }
    }
}

impl HillParameters {
    pub fn new(
        rows: usize,
        columns: usize,
        num_hills: u32,
        radius_min: u32,
        radius_max: u32,
        height_min: f32,
        height_max: f32,
    ) -> Self {
        Self {
            rows,
            columns,
            num_hills,
            radius_min,
            radius_max,
            height_min,
            height_max,
        }
    }

    /// Checks the parameters before any random draws happen.
    pub fn validate(&self) -> Result<(), HillError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(HillError::EmptyGrid(self.rows, self.columns));
        }
        if self.radius_min == 0 || self.radius_min > self.radius_max {
            return Err(HillError::InvalidRadiusRange(self.radius_min, self.radius_max));
        }
        if !self.height_min.is_finite()
            || !self.height_max.is_finite()
            || self.height_min < 0.0
            || self.height_min > self.height_max
        {
            return Err(HillError::InvalidHeightRange(self.height_min, self.height_max));
        }
        Ok(())
    }

    /// Reads parameters from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A single placed hill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hill {
    pub center_row: usize,
    pub center_column: usize,
    pub radius: u32,
    pub height: f32,
}

/// Adds one hill's radial falloff to the field.
///
/// Every cell in the square of `radius` around the center (clipped to the grid)
/// with `radius² - dx² - dy² >= 0` receives `height * falloff / radius²`, then the
/// cell is clamped to at most 1.0. There is no lower clamp.
pub fn raise_hill(field: &mut HeightField, hill: &Hill) {
    if field.is_empty() || hill.radius == 0 {
        return;
    }

    // i64 and f64 keep radii up to u32::MAX from overflowing.
    let radius = hill.radius as i64;
    let r2 = (hill.radius as f64).powi(2);
    let center_row = hill.center_row as i64;
    let center_col = hill.center_column as i64;

    let row_lo = (center_row - radius).max(0);
    let row_hi = (center_row + radius).min(field.rows() as i64 - 1);
    let col_lo = (center_col - radius).max(0);
    let col_hi = (center_col + radius).min(field.columns() as i64 - 1);

    for r in row_lo..=row_hi {
        for c in col_lo..=col_hi {
            let dy = (center_row - r) as f64;
            let dx = (center_col - c) as f64;
            let falloff = r2 - (dx * dx + dy * dy);
            if falloff < 0.0 {
                continue;
            }
            let cell = field.get_mut(r as usize, c as usize);
            *cell = (*cell + hill.height * (falloff / r2) as f32).min(1.0);
        }
    }
}

/// Draws one hill: center row, center column, radius, then peak height.
fn draw_hill<R: Rng>(params: &HillParameters, rng: &mut R) -> Hill {
    let center_row = rng.random_range(0..params.rows);
    let center_column = rng.random_range(0..params.columns);
    let radius = rng.random_range(params.radius_min..=params.radius_max);
    let height = rng.random_range(params.height_min..=params.height_max);
    Hill {
        center_row,
        center_column,
        radius,
        height,
    }
}

/// Generates a heightfield by accumulating `num_hills` random hills.
///
/// # Arguments
/// * `params` - Grid size and hill ranges
/// * `rng` - Random source for placement, radius and height
pub fn generate_hills<R: Rng>(
    params: &HillParameters,
    rng: &mut R,
) -> Result<HeightField, HillError> {
    params.validate()?;

    let mut field = HeightField::new(params.rows, params.columns);
    for _ in 0..params.num_hills {
        let hill = draw_hill(params, rng);
        raise_hill(&mut field, &hill);
    }

    log::debug!(
        "generated {}x{} height field with {} hills",
        params.rows,
        params.columns,
        params.num_hills
    );
    Ok(field)
}

/// Reproducible variant of [`generate_hills`] seeded with a `ChaCha8Rng`.
pub fn generate_hills_seeded(params: &HillParameters, seed: u64) -> Result<HeightField, HillError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_hills(params, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_hills_is_flat() {
        let params = HillParameters::new(32, 24, 0, 2, 6, 0.1, 0.9);
        let field = generate_hills_seeded(&params, 7).unwrap();
        assert_eq!(field.rows(), 32);
        assert_eq!(field.columns(), 24);
        assert!(field.as_slice().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_generated_heights_in_unit_range() {
        let params = HillParameters::new(64, 48, 200, 1, 12, 0.0, 1.0);
        for seed in 0..4 {
            let field = generate_hills_seeded(&params, seed).unwrap();
            assert!(field.as_slice().iter().all(|&h| (0.0..=1.0).contains(&h)));
        }

        let (min, max) = generate_hills_seeded(&params, 99).unwrap().height_range();
        assert!(min < max, "200 hills should produce variation");
    }

    #[test]
    fn test_fixed_hill_scenario() {
        let mut field = HeightField::new(4, 4);
        raise_hill(
            &mut field,
            &Hill { center_row: 1, center_column: 1, radius: 2, height: 1.0 },
        );

        for r in 0..4 {
            for c in 0..4 {
                let dr = r as i32 - 1;
                let dc = c as i32 - 1;
                let d2 = dr * dr + dc * dc;
                let expected = if d2 <= 4 { (4 - d2) as f32 / 4.0 } else { 0.0 };
                assert!(
                    (field.get(r, c) - expected).abs() < 1e-6,
                    "cell ({r}, {c}) = {} expected {expected}",
                    field.get(r, c)
                );
            }
        }
        assert_eq!(field.get(1, 1), 1.0);
        assert_eq!(field.get(3, 3), 0.0);
    }

    #[test]
    fn test_overlapping_hills_clamp_at_one() {
        let mut field = HeightField::new(5, 5);
        let hill = Hill { center_row: 2, center_column: 2, radius: 2, height: 0.8 };
        raise_hill(&mut field, &hill);
        raise_hill(&mut field, &hill);

        assert_eq!(field.get(2, 2), 1.0);
        // 0.8 * 3/4 twice = 1.2, clamped
        assert_eq!(field.get(2, 3), 1.0);
        // 0.8 * 0/4 on the rim
        assert_eq!(field.get(2, 4), 0.0);
    }

    #[test]
    fn test_hill_clipped_at_grid_edge() {
        let mut field = HeightField::new(3, 3);
        raise_hill(
            &mut field,
            &Hill { center_row: 0, center_column: 0, radius: 3, height: 1.0 },
        );
        assert_eq!(field.get(0, 0), 1.0);
        assert!((field.get(2, 2) - (9.0 - 8.0) / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let params = HillParameters::default();
        let a = generate_hills_seeded(&params, 1234).unwrap();
        let b = generate_hills_seeded(&params, 1234).unwrap();
        let c = generate_hills_seeded(&params, 4321).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut params = HillParameters::new(0, 10, 1, 1, 2, 0.0, 1.0);
        assert_eq!(params.validate(), Err(HillError::EmptyGrid(0, 10)));

        params.rows = 10;
        params.radius_min = 0;
        assert!(matches!(params.validate(), Err(HillError::InvalidRadiusRange(0, 2))));

        params.radius_min = 3;
        assert!(matches!(generate_hills_seeded(&params, 0), Err(HillError::InvalidRadiusRange(3, 2))));

        params.radius_min = 1;
        params.height_min = 2.0;
        assert!(matches!(params.validate(), Err(HillError::InvalidHeightRange(_, _))));
    }

    #[test]
    fn test_params_from_json_uses_defaults() {
        let params: HillParameters = serde_json::from_str(r#"{ "rows": 10, "num_hills": 3 }"#).unwrap();
        assert_eq!(params.rows, 10);
        assert_eq!(params.num_hills, 3);
        assert_eq!(params.columns, HillParameters::default().columns);
    }

    #[test]
    fn test_params_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hills.json");
        std::fs::write(&path, r#"{ "columns": 64, "height_max": 0.5 }"#).unwrap();

        let params = HillParameters::from_json_file(&path).unwrap();
        assert_eq!(params.columns, 64);
        assert_eq!(params.height_max, 0.5);
        assert_eq!(params.rows, HillParameters::default().rows);
    }

    #[test]
    fn test_negative_heights_are_rejected() {
        let params = HillParameters::new(16, 16, 5, 2, 4, -1.0, -0.5);
        assert!(matches!(params.validate(), Err(HillError::InvalidHeightRange(_, _))));
        assert!(generate_hills_seeded(&params, 1).is_err());

        let params = HillParameters::new(16, 16, 5, 2, 4, -0.1, 0.5);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_huge_radius_does_not_overflow() {
        let params = HillParameters::new(4, 4, 1, u32::MAX, u32::MAX, 0.5, 0.5);
        let field = generate_hills_seeded(&params, 3).unwrap();
        // A radius this large makes the hill effectively flat over the grid.
        for &h in field.as_slice() {
            assert!((h - 0.5).abs() < 1e-6, "got {h}");
        }
    }
}
