//! Erosion configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Droplet erosion parameters.
///
/// These are plain fields meant to be tuned live by a control surface; the
/// simulator reads them at the start of each call and never validates them.
/// Physically meaningless values (negative rates, zero density) are the
/// caller's problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionConfig {
    /// Integration time step.
    pub dt: f32,
    /// Fluid density; divides the gradient acceleration together with volume.
    pub density: f32,
    /// Fraction of volume lost per unit time.
    pub evaporation_rate: f32,
    /// Rate at which carried sediment approaches capacity.
    pub deposition_rate: f32,
    /// A droplet stops once its volume is at or below this.
    pub min_volume: f32,
    /// Velocity damping per unit time.
    pub friction: f32,

    /// Droplets simulated per erosion invocation.
    pub cycles: u32,
    /// Erosion invocations still to run on a [`TerrainContext`](crate::terrain::TerrainContext).
    pub remaining: u32,
    /// Invocations run per context tick.
    pub steps_per_tick: u32,

    /// Hard cap on iterations of a single droplet.
    ///
    /// With zero evaporation (or a step that never shrinks the volume) a droplet
    /// would otherwise run until it leaves the grid, possibly forever.
    pub max_droplet_steps: u32,
    /// Vertical exaggeration used by the surface normal estimate.
    pub gradient_scale: f32,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            dt: 1.2,
            density: 1.0,
            evaporation_rate: 0.001,
            deposition_rate: 0.1,
            min_volume: 0.01,
            friction: 0.05,

            cycles: 50,
            remaining: 5,
            steps_per_tick: 1,

            max_droplet_steps: 10_000,
            gradient_scale: 60.0,
        }
    }
}

impl ErosionConfig {
    /// Reads a JSON config file. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes this config as pretty-printed JSON.
    pub fn write_json_file(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}
