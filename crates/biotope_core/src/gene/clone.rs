use super::PopulationContext;
use crate::error::{check_index, EngineError, Result};
use crate::matrix::{check_shape, cumsum_rows, sample_categorical, Matrix};
use crate::population::Population;
use crate::signal::SignalLevels;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Per-element signal mutation applied when an individual is cloned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub probability: f64,
    pub sigma: f64,
}

impl Mutation {
    pub fn new(probability: f64, sigma: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(EngineError::config(format!(
                "mutation probability must lie in [0, 1], got {probability}"
            )));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(EngineError::config(format!(
                "mutation sigma must be finite and non-negative, got {sigma}"
            )));
        }
        Ok(Self { probability, sigma })
    }

    /// Copies `signals`, perturbing each element with probability
    /// `probability` by a normal draw of deviation `sigma`, then clipping the
    /// result into `[0, 1]`. Untouched elements are copied unchanged.
    pub fn clone_signals<R: Rng + ?Sized>(&self, signals: &Matrix, rng: &mut R) -> Result<Matrix> {
        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| EngineError::config(format!("mutation sigma: {e}")))?;
        let mut out = signals.clone();
        for s in out.iter_mut() {
            if rng.gen::<f64>() < self.probability {
                *s = (*s + normal.sample(rng)).clamp(0.0, 1.0);
            }
        }
        Ok(out)
    }
}

/// Drives reproduction: decodes mass and energy thresholds plus two rates,
/// and clones individuals whose surpluses make it likely.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneGene {
    mass_threshold: SignalLevels,
    energy_threshold: SignalLevels,
    mass_rate: SignalLevels,
    energy_rate: SignalLevels,
    offspring_fraction: f64,
    offspring_energy: f64,
    migration: Vec<f64>,
    mutation: Mutation,
}

impl CloneGene {
    /// `migration` weighs where a child lands: index 0 is the parent's cell,
    /// index `k` the parent's `k`-th neighbour. It must hold one weight per
    /// choice of the topology the species lives on.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mass_threshold: SignalLevels,
        energy_threshold: SignalLevels,
        mass_rate: SignalLevels,
        energy_rate: SignalLevels,
        offspring_fraction: f64,
        offspring_energy: f64,
        migration: Vec<f64>,
        mutation: Mutation,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&offspring_fraction) {
            return Err(EngineError::config(format!(
                "offspring fraction must lie in [0, 1), got {offspring_fraction}"
            )));
        }
        if !offspring_energy.is_finite() || offspring_energy < 0.0 {
            return Err(EngineError::config(format!(
                "offspring energy must be non-negative, got {offspring_energy}"
            )));
        }
        let weights_ok = migration.iter().all(|w| w.is_finite() && *w >= 0.0);
        if migration.is_empty() || !weights_ok || migration.iter().sum::<f64>() <= 0.0 {
            return Err(EngineError::config(
                "migration weights must be non-negative with a positive sum",
            ));
        }
        Ok(Self {
            mass_threshold,
            energy_threshold,
            mass_rate,
            energy_rate,
            offspring_fraction,
            offspring_energy,
            migration,
            mutation,
        })
    }

    #[must_use]
    pub fn signal_count(&self) -> usize {
        4
    }

    #[must_use]
    pub fn migration(&self) -> &[f64] {
        &self.migration
    }

    #[must_use]
    pub fn mutation(&self) -> Mutation {
        self.mutation
    }

    /// Per-individual probability of cloning during `dt`.
    ///
    /// Mass and energy surpluses above their thresholds each drive an
    /// independent exponential waiting time; the individual clones only if
    /// both would have fired, so the smaller probability wins.
    pub fn clone_probability(
        &self,
        population: &Population,
        slot: usize,
        ctx: &PopulationContext<'_>,
    ) -> Result<Vec<f64>> {
        let signals = population.population_signals(slot)?;
        check_shape("clone gene signals", signals, 4, population.len())?;
        check_index("energy row", ctx.energy_index, population.resources().nrows())?;

        let mass_threshold = self.mass_threshold.decode_row(signals.row(0));
        let energy_threshold = self.energy_threshold.decode_row(signals.row(1));
        let mass_rate = self.mass_rate.decode_row(signals.row(2));
        let energy_rate = self.energy_rate.decode_row(signals.row(3));
        let mass = population.total_mass(ctx.molecular_masses)?;
        let energy = population.resources().row(ctx.energy_index);

        Ok((0..population.len())
            .map(|i| {
                let d_mass = (mass[i] - mass_threshold[i]).max(0.0);
                let d_energy = (energy[i] - energy_threshold[i]).max(0.0);
                let p_mass = -(-d_mass * mass_rate[i] * ctx.dt).exp_m1();
                let p_energy = -(-d_energy * energy_rate[i] * ctx.dt).exp_m1();
                p_mass.min(p_energy)
            })
            .collect())
    }

    pub fn execute<R: Rng + ?Sized>(
        &self,
        population: Population,
        slot: usize,
        ctx: &PopulationContext<'_>,
        rng: &mut R,
    ) -> Result<Population> {
        if population.is_empty() {
            return Ok(population);
        }
        let choices = ctx.topology.neighbors_per_cell() + 1;
        if self.migration.len() != choices {
            return Err(EngineError::shape(
                "clone migration weights",
                (choices, 1),
                (self.migration.len(), 1),
            ));
        }

        let probability = self.clone_probability(&population, slot, ctx)?;
        let parents: Vec<usize> = probability
            .iter()
            .enumerate()
            .filter(|&(_, &p)| rng.gen::<f64>() < p)
            .map(|(i, _)| i)
            .collect();
        if parents.is_empty() {
            return Ok(population);
        }

        let weights = Matrix::from_shape_fn((choices, parents.len()), |(row, _)| {
            self.migration[row]
        });
        let cdf = cumsum_rows(&weights);
        let draws: Vec<f64> = (0..parents.len()).map(|_| rng.gen()).collect();
        let directions = sample_categorical(&cdf, &draws)?;

        let locations = population.locations();
        let child_locations = parents
            .iter()
            .zip(&directions)
            .map(|(&parent, &direction)| match direction {
                0 => Ok(locations[parent]),
                d => ctx.topology.adjacent(locations[parent], d - 1),
            })
            .collect::<Result<Vec<usize>>>()?;

        tracing::trace!(births = parents.len(), "clone gene fired");
        population.perform_clone(
            &parents,
            &child_locations,
            self.offspring_fraction,
            self.offspring_energy,
            ctx.energy_index,
            &self.mutation,
            rng,
        )
    }
}
