//! Droplet hydraulic erosion.
//!
//! Water particles are spawned on random cells, accelerate along the surface
//! gradient and trade sediment with the heightfield as they move.

mod config;
mod droplet;
mod gradient;

pub use config::{ConfigError, ErosionConfig};
pub use droplet::{simulate_droplet, DropletOutcome, ErosionReport, ErosionSimulator, Particle, Termination};
pub use gradient::surface_normal;
