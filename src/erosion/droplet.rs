//! Droplet (particle) hydraulic erosion.
//!
//! Each droplet spawns on a random cell, slides along the estimated surface
//! gradient, and exchanges sediment with the cell it just left. Droplets never
//! see each other except through the height grid they all modify.

use std::ops::AddAssign;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::config::ErosionConfig;
use super::gradient::surface_normal;
use crate::terrain::HeightField;

/// A single water droplet.
///
/// `position.x` runs along rows and `position.y` along columns, both in cell units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Starts at 1.0 and shrinks by evaporation.
    pub volume: f32,
    /// Carried sediment, starts at 0.0.
    pub sediment: f32,
}

impl Particle {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            volume: 1.0,
            sediment: 0.0,
        }
    }

    /// Integer cell under the droplet. Only valid for non-negative positions.
    fn cell(&self) -> (usize, usize) {
        (self.position.x as usize, self.position.y as usize)
    }
}

/// Why a droplet stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Volume dropped to `min_volume` or below.
    Evaporated,
    /// The droplet moved off the grid.
    LeftGrid,
    /// `max_droplet_steps` was reached.
    StepLimit,
}

/// Result of simulating one droplet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropletOutcome {
    pub steps: u32,
    pub termination: Termination,
    /// Droplet state when it stopped.
    pub particle: Particle,
}

/// Aggregate statistics over an erosion invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErosionReport {
    pub droplets: u32,
    pub total_steps: u64,
    pub evaporated: u32,
    pub left_grid: u32,
    pub step_limited: u32,
}

impl ErosionReport {
    fn record(&mut self, outcome: &DropletOutcome) {
        self.droplets += 1;
        self.total_steps += outcome.steps as u64;
        match outcome.termination {
            Termination::Evaporated => self.evaporated += 1,
            Termination::LeftGrid => self.left_grid += 1,
            Termination::StepLimit => self.step_limited += 1,
        }
    }
}

impl AddAssign for ErosionReport {
    fn add_assign(&mut self, other: Self) {
        self.droplets += other.droplets;
        self.total_steps += other.total_steps;
        self.evaporated += other.evaporated;
        self.left_grid += other.left_grid;
        self.step_limited += other.step_limited;
    }
}

/// Runs one droplet from `start` until it evaporates, leaves the grid, or hits
/// the step limit. `observer` sees the particle after every completed step.
///
/// # Panics
/// Panics if `start` lies outside the field.
pub fn simulate_droplet<F>(
    field: &mut HeightField,
    start: Vec2,
    config: &ErosionConfig,
    mut observer: F,
) -> DropletOutcome
where
    F: FnMut(&Particle),
{
    assert!(
        start.x >= 0.0
            && start.y >= 0.0
            && start.x < field.rows() as f32
            && start.y < field.columns() as f32,
        "droplet must start inside the grid"
    );

    let dt = config.dt;
    let bounds = Vec2::new(field.rows() as f32, field.columns() as f32);
    let mut drop = Particle::new(start);
    let mut steps = 0u32;

    let termination = loop {
        if drop.volume <= config.min_volume {
            break Termination::Evaporated;
        }
        if steps >= config.max_droplet_steps {
            break Termination::StepLimit;
        }

        let (row, column) = drop.cell();
        let n = surface_normal(field, row, column, config.gradient_scale);

        drop.velocity += dt * Vec2::new(n.x, n.z) / (drop.volume * config.density);
        drop.position += dt * drop.velocity;
        drop.velocity *= 1.0 - dt * config.friction;
        steps += 1;

        // NaN positions fail these comparisons too.
        let inside = drop.position.x >= 0.0
            && drop.position.y >= 0.0
            && drop.position.x < bounds.x
            && drop.position.y < bounds.y;
        if !inside {
            observer(&drop);
            break Termination::LeftGrid;
        }

        let (new_row, new_column) = drop.cell();
        let drop_height = field.get(row, column) - field.get(new_row, new_column);
        let capacity = (drop.volume * drop.velocity.length() * drop_height).max(0.0);

        let sediment_delta = capacity - drop.sediment;
        drop.sediment += dt * config.deposition_rate * sediment_delta;
        *field.get_mut(row, column) -= dt * drop.volume * config.deposition_rate * sediment_delta;

        drop.volume *= 1.0 - dt * config.evaporation_rate;
        observer(&drop);
    };

    DropletOutcome {
        steps,
        termination,
        particle: drop,
    }
}

/// Runs droplet erosion against a heightfield with an injected random source.
pub struct ErosionSimulator<R: Rng> {
    rng: R,
}

impl ErosionSimulator<ChaCha8Rng> {
    /// Creates a simulator with a reproducible `ChaCha8Rng`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ErosionSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Simulates `cycles` droplets one after another, mutating `field` in place.
    pub fn erode(&mut self, field: &mut HeightField, cycles: u32, config: &ErosionConfig) -> ErosionReport {
        self.erode_observed(field, cycles, config, |_, _| {})
    }

    /// Like [`erode`](Self::erode) but reports every droplet step as
    /// `(droplet_index, particle)`.
    pub fn erode_observed<F>(
        &mut self,
        field: &mut HeightField,
        cycles: u32,
        config: &ErosionConfig,
        mut observer: F,
    ) -> ErosionReport
    where
        F: FnMut(u32, &Particle),
    {
        let mut report = ErosionReport::default();
        if field.is_empty() {
            return report;
        }

        for i in 0..cycles {
            let start = Vec2::new(
                self.rng.random_range(0..field.rows()) as f32,
                self.rng.random_range(0..field.columns()) as f32,
            );
            let outcome = simulate_droplet(field, start, config, |p| observer(i, p));
            report.record(&outcome);
        }

        log::debug!(
            "eroded with {} droplets: {} steps, {} evaporated, {} left grid, {} hit step limit",
            report.droplets,
            report.total_steps,
            report.evaporated,
            report.left_grid,
            report.step_limited
        );
        report
    }
}
