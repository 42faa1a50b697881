//! The per-step pipeline tying every phase together.

use crate::config::EngineConfig;
use crate::error::{check_index, EngineError, Result};
use crate::gene::PopulationContext;
use crate::matrix::{check_len, check_shape, Matrix, Vector};
use crate::metrics::{Metrics, BIRTHS, DEATHS};
use crate::population::distribution_shares;
use crate::status::SimulationStatus;
use crate::systems::{biological, environment, metabolic, reproduction};
use crate::topology::Topology;
use biotope_data::StatusSnapshot;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;

/// Advances a [`SimulationStatus`] through time.
///
/// The engine holds only immutable world parameters plus metrics; all
/// mutable state lives in the status passed through [`next`](Self::next).
#[derive(Debug)]
pub struct SimulationEngine {
    topology: Arc<Topology>,
    molecular_masses: Vector,
    diffusion: Matrix,
    energy_index: usize,
    light: f64,
    max_time_step: f64,
    metrics: Metrics,
}

impl SimulationEngine {
    /// `diffusion` holds one coefficient per resource row and cell.
    pub fn new(
        topology: Arc<Topology>,
        molecular_masses: Vector,
        diffusion: Matrix,
        energy_index: usize,
        light: f64,
        max_time_step: f64,
    ) -> Result<Self> {
        let resources = molecular_masses.len();
        check_shape("diffusion field", &diffusion, resources, topology.cell_count())?;
        check_index("energy row", energy_index, resources)?;
        if !max_time_step.is_finite() || max_time_step <= 0.0 {
            return Err(EngineError::config(format!(
                "max time step must be positive, got {max_time_step}"
            )));
        }
        let stable = topology.stable_time_step(&diffusion)?;
        if max_time_step > stable {
            return Err(EngineError::config(format!(
                "max time step {max_time_step} exceeds the stable diffusion step {stable}"
            )));
        }
        if !light.is_finite() || light < 0.0 {
            return Err(EngineError::config(format!(
                "light intensity must be non-negative, got {light}"
            )));
        }
        Ok(Self {
            topology,
            molecular_masses,
            diffusion,
            energy_index,
            light,
            max_time_step,
            metrics: Metrics::new(),
        })
    }

    /// Builds the honeycomb world described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let topology = Topology::honeycomb(
            config.topology.width,
            config.topology.height,
            config.topology.unit_length,
        )?;
        let diffusion = config.diffusion_field(topology.cell_count());
        Self::new(
            Arc::new(topology),
            config.molecular_masses(),
            diffusion,
            config.engine.energy_index,
            config.light.intensity,
            config.engine.max_time_step,
        )
    }

    #[must_use]
    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    #[must_use]
    pub fn molecular_masses(&self) -> &Vector {
        &self.molecular_masses
    }

    #[must_use]
    pub fn energy_index(&self) -> usize {
        self.energy_index
    }

    #[must_use]
    pub fn max_time_step(&self) -> f64 {
        self.max_time_step
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn snapshot(&self, status: &SimulationStatus) -> Result<StatusSnapshot> {
        status.snapshot(&self.molecular_masses, self.energy_index)
    }

    /// Advances `status` to `target_time` in steps no longer than the
    /// engine's max time step. A target at or before the current time
    /// returns the status unchanged. Fails with
    /// [`EngineError::StalledTime`] when a step is too small to move time.
    pub fn next<R: Rng + ?Sized>(
        &self,
        mut status: SimulationStatus,
        target_time: f64,
        rng: &mut R,
    ) -> Result<SimulationStatus> {
        if !target_time.is_finite() {
            return Err(EngineError::config(format!(
                "target time must be finite, got {target_time}"
            )));
        }
        while status.time < target_time {
            let remaining = target_time - status.time;
            let dt = remaining.min(self.max_time_step);
            if dt < remaining && status.time + dt <= status.time {
                return Err(EngineError::StalledTime {
                    time: status.time,
                    dt,
                });
            }
            status = self.step(status, dt, rng)?;
            if dt == remaining {
                status.time = target_time;
            }
        }
        Ok(status)
    }

    /// One pass of the fixed phase order:
    /// diffusion, metabolism, survival, photo reactions, internal
    /// reactions, environment exchange, population genes.
    pub fn step<R: Rng + ?Sized>(
        &self,
        status: SimulationStatus,
        dt: f64,
        rng: &mut R,
    ) -> Result<SimulationStatus> {
        let started = Instant::now();
        let cells = self.topology.cell_count();
        let SimulationStatus {
            mut environment,
            mut populations,
            time,
        } = status;
        check_shape(
            "environment",
            &environment,
            self.molecular_masses.len(),
            cells,
        )?;

        environment::diffuse(&mut environment, &self.topology, &self.diffusion, dt)?;

        biological::maintain(&mut populations, &self.molecular_masses, self.energy_index, dt)?;
        let (mut populations, deaths) = biological::survive(
            populations,
            &self.molecular_masses,
            self.energy_index,
            &mut environment,
        )?;

        let shares = distribution_shares(&populations, &self.molecular_masses, cells)?;
        metabolic::photosynthesis(&mut populations, &shares, self.light, dt)?;
        metabolic::react(&mut populations, &shares, dt)?;

        let shares = distribution_shares(&populations, &self.molecular_masses, cells)?;
        metabolic::exchange(&mut populations, &mut environment, &shares)?;

        let ctx = PopulationContext {
            topology: &self.topology,
            molecular_masses: &self.molecular_masses,
            energy_index: self.energy_index,
            dt,
        };
        let (populations, births) = reproduction::reproduce(populations, &ctx, rng)?;

        let next = SimulationStatus {
            environment,
            populations,
            time: time + dt,
        };
        let individuals = next.individuals();
        self.metrics.add_to_counter(BIRTHS, births as u64);
        self.metrics.add_to_counter(DEATHS, deaths as u64);
        self.metrics
            .record_step(started.elapsed(), next.time, individuals);
        tracing::debug!(
            time = next.time,
            dt,
            individuals,
            births,
            deaths,
            "step complete"
        );
        Ok(next)
    }

    /// Checks a status produced outside the engine before it is advanced.
    pub fn check_status(&self, status: &SimulationStatus) -> Result<()> {
        check_shape(
            "environment",
            &status.environment,
            self.molecular_masses.len(),
            self.topology.cell_count(),
        )?;
        for population in &status.populations {
            check_len(
                "molecular masses",
                &self.molecular_masses,
                population.resources().nrows(),
            )?;
            population
                .species()
                .check_compatible(self.molecular_masses.len(), self.topology.neighbors_per_cell())?;
        }
        Ok(())
    }
}
